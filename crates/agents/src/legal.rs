//! Legal agent — answers real-estate law questions from the retrieved
//! corpus, and only from it. When nothing relevant enough comes back,
//! it says so explicitly instead of improvising.

use async_trait::async_trait;
use riad_config::LegalConfig;
use riad_core::adapter::LegalRetrieval;
use riad_core::conversation::{Conversation, FlowAgent, InboundMessage, StateDelta};
use riad_core::error::Result;
use riad_core::intent::RouteTarget;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use crate::parse::mentions_any;
use crate::router::LEGAL_KEYWORDS;
use crate::{Agent, AgentOutcome};

pub const NO_RELIABLE_ANSWER: &str =
    "⚖️ Je n'ai pas de réponse fiable à cette question dans ma documentation \
     juridique. Reformule-la autrement, ou consulte un notaire pour un avis sûr.";

pub struct LegalAgent {
    retrieval: Arc<dyn LegalRetrieval>,
    config: LegalConfig,
}

impl LegalAgent {
    pub fn new(retrieval: Arc<dyn LegalRetrieval>, config: LegalConfig) -> Self {
        Self { retrieval, config }
    }
}

#[async_trait]
impl Agent for LegalAgent {
    fn target(&self) -> RouteTarget {
        RouteTarget::Legal
    }

    fn can_continue(&self, conversation: &Conversation, message: &InboundMessage) -> bool {
        conversation.active_agent == Some(FlowAgent::Legal)
            && (message.text.contains('?') || mentions_any(&message.text, LEGAL_KEYWORDS))
    }

    async fn handle(
        &self,
        _conversation: &Conversation,
        message: &InboundMessage,
    ) -> Result<AgentOutcome> {
        let passages = self
            .retrieval
            .retrieve(&message.text, self.config.top_k)
            .await?;

        let grounded: Vec<_> = passages
            .into_iter()
            .filter(|p| p.score >= self.config.min_score)
            .collect();

        if grounded.is_empty() {
            debug!("No passage above relevance threshold");
            return Ok(AgentOutcome::reply_only(NO_RELIABLE_ANSWER));
        }

        let sources: BTreeSet<&str> = grounded.iter().map(|p| p.source.as_str()).collect();
        let mut reply = String::from("⚖️ Voici ce que disent les textes :\n");
        for passage in &grounded {
            reply.push_str(&format!("\n• {}", passage.text.trim()));
        }
        reply.push_str(&format!(
            "\n\n📚 Sources : {}\n\n💡 Pour un cas précis, consulte un notaire.",
            sources.into_iter().collect::<Vec<_>>().join(", ")
        ));

        Ok(AgentOutcome {
            reply,
            delta: StateDelta::none().set_active(Some(FlowAgent::Legal)),
        })
    }
}
