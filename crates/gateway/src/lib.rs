//! Message gateway for riad.
//!
//! Maps one inbound transport message to one supervisor invocation:
//! acquire the identity's turn lock, load (or create) the conversation,
//! run the supervisor, save with compare-and-swap, fragment the reply.
//! A store failure never crashes the handling process — the user gets a
//! generic try-again reply and other identities keep being served.

pub mod fragment;
pub mod session;
pub mod transport;

use riad_agents::Supervisor;
use riad_core::adapter::ConversationStore;
use riad_core::conversation::{Conversation, InboundMessage, UserId};
use riad_core::error::{GatewayError, StoreError};
use riad_core::event::{DomainEvent, EventBus};
use std::sync::Arc;
use tracing::{error, warn};

pub use session::SessionMap;
pub use transport::{ConsoleTransport, Transport, WhatsappTransport};

const STORE_APOLOGY: &str =
    "⚠️ Service temporairement indisponible. Réessaie dans quelques minutes.";

pub struct MessageGateway {
    store: Arc<dyn ConversationStore>,
    supervisor: Arc<Supervisor>,
    sessions: SessionMap,
    events: Arc<EventBus>,
    fragment_cap: usize,
}

impl MessageGateway {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        supervisor: Arc<Supervisor>,
        events: Arc<EventBus>,
        fragment_cap: usize,
    ) -> Self {
        Self {
            store,
            supervisor,
            sessions: SessionMap::new(),
            events,
            fragment_cap,
        }
    }

    /// The core entry point: one inbound message in, ordered reply
    /// fragments out. Never fails toward the transport — store errors
    /// degrade to an apology reply.
    pub async fn process_inbound(&self, user: &UserId, message: InboundMessage) -> Vec<String> {
        let _turn_lock = self.sessions.acquire(user).await;
        self.locked_turn(user, &message).await
    }

    /// Process and deliver inside the same critical section, so two
    /// replies to one identity can never interleave on the wire.
    pub async fn serve(
        &self,
        user: &UserId,
        message: InboundMessage,
        transport: &dyn Transport,
    ) -> Result<(), GatewayError> {
        let _turn_lock = self.sessions.acquire(user).await;
        let fragments = self.locked_turn(user, &message).await;
        transport.deliver(user, &fragments).await
    }

    /// One turn under the identity lock. Retries exactly once on a save
    /// conflict (a lost race with another process sharing the store).
    async fn locked_turn(&self, user: &UserId, message: &InboundMessage) -> Vec<String> {
        for attempt in 0..2 {
            let mut conversation = match self.store.load(user).await {
                Ok(Some(conversation)) => conversation,
                Ok(None) => Conversation::new(user.clone()),
                Err(e) => return self.store_failure(user, "load", e),
            };

            let outcome = self.supervisor.take_turn(&mut conversation, message).await;

            match self.store.save(&conversation).await {
                Ok(()) => {
                    self.events.publish(DomainEvent::TurnCompleted {
                        user: user.0.clone(),
                        agent: outcome.agent,
                        failed: outcome.error.is_some(),
                        timestamp: chrono::Utc::now(),
                    });
                    return fragment::split(&outcome.reply, self.fragment_cap);
                }
                Err(StoreError::Conflict { stored, expected, .. }) if attempt == 0 => {
                    warn!(user = %user, stored, expected, "Save conflict; replaying turn");
                    continue;
                }
                Err(e) => return self.store_failure(user, "save", e),
            }
        }

        // Second conflict in a row: give up rather than loop
        fragment::split(STORE_APOLOGY, self.fragment_cap)
    }

    fn store_failure(&self, user: &UserId, operation: &str, e: StoreError) -> Vec<String> {
        error!(user = %user, operation, error = %e, "Conversation store failure");
        self.events.publish(DomainEvent::ErrorOccurred {
            context: format!("store {operation} for {user}"),
            error_message: e.to_string(),
            timestamp: chrono::Utc::now(),
        });
        fragment::split(STORE_APOLOGY, self.fragment_cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use riad_agents::{
        Agent, AlertsAgent, IntentRouter, LegalAgent, NegotiationAgent, SearchAgent,
        SmalltalkAgent,
    };
    use riad_config::{LegalConfig, NegotiationConfig};
    use riad_core::listing::{ListingId, ListingSummary, TransactionKind};
    use riad_store::InMemoryStore;
    use riad_tools::legal::Passage;
    use riad_tools::{CatalogSearch, CorpusRetriever, InMemoryAlertStore};
    use std::time::Duration;

    fn listing(id: &str, price: f64) -> ListingSummary {
        ListingSummary {
            id: ListingId::from(id),
            title: format!("Appartement {id}"),
            location: "Casablanca".into(),
            price,
            transaction: TransactionKind::Sale,
            property_type: "appartement".into(),
            bedrooms: 2,
            surface: Some(85.0),
            image_token: None,
            posted_at: chrono::Utc::now(),
        }
    }

    fn gateway_with_cap(cap: usize) -> MessageGateway {
        let alerts = Arc::new(InMemoryAlertStore::default());
        let catalog = Arc::new(CatalogSearch::with_listings(vec![
            listing("a", 450_000.0),
            listing("b", 520_000.0),
        ]));
        let retriever = Arc::new(CorpusRetriever::new(vec![Passage::new(
            "Les frais de notaire représentent environ 6 à 7% du prix.",
            "frais_acquisition.md",
        )]));
        let agents: Vec<Arc<dyn Agent>> = vec![
            Arc::new(SearchAgent::new(catalog, alerts.clone(), 5)),
            Arc::new(NegotiationAgent::new(NegotiationConfig::default())),
            Arc::new(LegalAgent::new(retriever, LegalConfig::default())),
            Arc::new(AlertsAgent::new(alerts)),
            Arc::new(SmalltalkAgent),
        ];
        let supervisor = Arc::new(Supervisor::new(
            agents,
            IntentRouter::new(0.35),
            Duration::from_secs(5),
            40,
        ));
        MessageGateway::new(
            Arc::new(InMemoryStore::new()),
            supervisor,
            Arc::new(EventBus::default()),
            cap,
        )
    }

    #[tokio::test]
    async fn first_contact_creates_a_conversation() {
        let gateway = gateway_with_cap(1500);
        let user = UserId::from("+212600000001");

        let fragments = gateway
            .process_inbound(&user, InboundMessage::text("Bonjour"))
            .await;
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].contains("Bienvenue"));

        let conversation = gateway.store.load(&user).await.unwrap().unwrap();
        assert_eq!(conversation.version, 1);
        assert_eq!(conversation.history.len(), 1);
    }

    #[tokio::test]
    async fn long_replies_are_fragmented() {
        let gateway = gateway_with_cap(60);
        let user = UserId::from("+212600000001");

        let fragments = gateway
            .process_inbound(&user, InboundMessage::text("appartement à Casablanca"))
            .await;
        assert!(fragments.len() > 1);
        for fragment in &fragments {
            assert!(fragment.chars().count() <= 60);
        }
    }

    #[tokio::test]
    async fn interleaved_sends_lose_no_turns() {
        let gateway = Arc::new(gateway_with_cap(1500));
        let user = UserId::from("+212600000001");

        let tasks: Vec<_> = (0..6)
            .map(|_| {
                let gateway = gateway.clone();
                let user = user.clone();
                tokio::spawn(async move {
                    gateway
                        .process_inbound(&user, InboundMessage::text("Bonjour"))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let conversation = gateway.store.load(&user).await.unwrap().unwrap();
        assert_eq!(conversation.version, 6);
        assert_eq!(conversation.history.len(), 6);
    }

    #[tokio::test]
    async fn distinct_identities_are_independent() {
        let gateway = Arc::new(gateway_with_cap(1500));

        let tasks: Vec<_> = (0..4)
            .map(|i| {
                let gateway = gateway.clone();
                tokio::spawn(async move {
                    let user = UserId::from(&format!("+2126000000{i:02}"));
                    gateway
                        .process_inbound(&user, InboundMessage::text("Bonjour"))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        for i in 0..4 {
            let user = UserId::from(&format!("+2126000000{i:02}"));
            let conversation = gateway.store.load(&user).await.unwrap().unwrap();
            assert_eq!(conversation.version, 1);
        }
    }

    /// A store whose every call fails, for degraded-mode tests.
    struct DeadStore;

    #[async_trait]
    impl ConversationStore for DeadStore {
        async fn load(&self, _user: &UserId) -> Result<Option<Conversation>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn save(&self, _conversation: &Conversation) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn dead_store_degrades_to_apology() {
        let healthy = gateway_with_cap(1500);
        let gateway = MessageGateway::new(
            Arc::new(DeadStore),
            healthy.supervisor.clone(),
            Arc::new(EventBus::default()),
            1500,
        );

        let fragments = gateway
            .process_inbound(&UserId::from("u1"), InboundMessage::text("Bonjour"))
            .await;
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].contains("indisponible"));
    }

    #[tokio::test]
    async fn serve_delivers_through_transport() {
        let gateway = gateway_with_cap(1500);
        gateway
            .serve(
                &UserId::from("u1"),
                InboundMessage::text("Bonjour"),
                &ConsoleTransport,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn turn_completed_events_are_published() {
        let gateway = gateway_with_cap(1500);
        let mut rx = gateway.events.subscribe();

        gateway
            .process_inbound(&UserId::from("u1"), InboundMessage::text("Bonjour"))
            .await;

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::TurnCompleted { user, failed, .. } => {
                assert_eq!(user, "u1");
                assert!(!failed);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
