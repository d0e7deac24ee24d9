//! Smalltalk agent — greetings, thanks, and the capabilities pitch.
//! Never touches conversation state.

use async_trait::async_trait;
use riad_core::conversation::{Conversation, InboundMessage};
use riad_core::error::Result;
use riad_core::intent::RouteTarget;

use crate::parse::mentions_any;
use crate::{Agent, AgentOutcome};

const WELCOME: &str = "Hey ! 👋 Bienvenue sur Riad !\n\n\
Je suis ton assistant immobilier. Je peux t'aider à :\n\
🔍 Trouver ton bien idéal\n\
💰 Négocier le meilleur prix\n\
⚖️ Répondre à tes questions juridiques\n\
🔔 Te prévenir quand un bien arrive\n\n\
Qu'est-ce qui t'amène aujourd'hui ?";

const THANKS: &str =
    "Avec plaisir ! 😊 N'hésite pas si tu as d'autres questions. Bonne recherche ! 🏡";

const GOODBYE: &str = "À bientôt ! 👋 Reviens quand tu veux, je garde un œil sur le marché.";

pub struct SmalltalkAgent;

#[async_trait]
impl Agent for SmalltalkAgent {
    fn target(&self) -> RouteTarget {
        RouteTarget::Smalltalk
    }

    fn can_continue(&self, _conversation: &Conversation, _message: &InboundMessage) -> bool {
        false
    }

    async fn handle(
        &self,
        _conversation: &Conversation,
        message: &InboundMessage,
    ) -> Result<AgentOutcome> {
        let reply = if mentions_any(&message.text, &["merci"]) {
            THANKS
        } else if mentions_any(&message.text, &["au revoir", "bye", "adieu"]) {
            GOODBYE
        } else {
            WELCOME
        };
        Ok(AgentOutcome::reply_only(reply))
    }
}
