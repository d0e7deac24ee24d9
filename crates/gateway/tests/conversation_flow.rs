//! End-to-end conversation scenarios through the full stack:
//! gateway → supervisor → agents → tool adapters, with a real store.

use async_trait::async_trait;
use riad_agents::{
    Agent, AlertsAgent, IntentRouter, LegalAgent, NegotiationAgent, SearchAgent, SmalltalkAgent,
    Supervisor,
};
use riad_config::AppConfig;
use riad_core::adapter::{AlertStore, ConversationStore, PropertySearch};
use riad_core::conversation::{Conversation, FlowAgent, InboundMessage, UserId};
use riad_core::error::ToolError;
use riad_core::event::EventBus;
use riad_core::listing::{ListingId, ListingSummary, SearchCriteria, TransactionKind};
use riad_gateway::MessageGateway;
use riad_store::InMemoryStore;
use riad_tools::legal::Passage;
use riad_tools::{CatalogSearch, CorpusRetriever, InMemoryAlertStore};
use std::sync::Arc;
use std::time::Duration;

fn listing(id: &str, price: f64, location: &str, bedrooms: u32) -> ListingSummary {
    ListingSummary {
        id: ListingId::from(id),
        title: format!("Appartement {id}"),
        location: location.into(),
        price,
        transaction: TransactionKind::Sale,
        property_type: "appartement".into(),
        bedrooms,
        surface: Some(90.0),
        image_token: None,
        posted_at: chrono::Utc::now(),
    }
}

struct Stack {
    gateway: MessageGateway,
    store: Arc<InMemoryStore>,
    alerts: Arc<InMemoryAlertStore>,
}

fn stack_with_search(search: Arc<dyn PropertySearch>) -> Stack {
    let config = AppConfig::default();
    let store = Arc::new(InMemoryStore::new());
    let alerts = Arc::new(InMemoryAlertStore::new(config.alerts.max_notifications));
    let retriever = Arc::new(CorpusRetriever::new(vec![
        Passage::new(
            "Les frais de notaire pour une acquisition représentent environ 6 à 7% du \
             prix : droits d'enregistrement, conservation foncière et honoraires.",
            "frais_acquisition.md",
        ),
        Passage::new(
            "Le bail d'habitation prévoit un préavis de trois mois.",
            "bail_habitation.md",
        ),
    ]));

    let agents: Vec<Arc<dyn Agent>> = vec![
        Arc::new(SearchAgent::new(search, alerts.clone(), config.max_results)),
        Arc::new(NegotiationAgent::new(config.negotiation.clone())),
        Arc::new(LegalAgent::new(retriever, config.legal.clone())),
        Arc::new(AlertsAgent::new(alerts.clone())),
        Arc::new(SmalltalkAgent),
    ];
    let supervisor = Arc::new(Supervisor::new(
        agents,
        IntentRouter::new(config.router.min_confidence),
        Duration::from_secs(config.gateway.turn_timeout_secs),
        config.history_limit,
    ));
    let gateway = MessageGateway::new(
        store.clone(),
        supervisor,
        Arc::new(EventBus::default()),
        config.gateway.fragment_cap,
    );
    Stack {
        gateway,
        store,
        alerts,
    }
}

fn stack() -> Stack {
    stack_with_search(Arc::new(CatalogSearch::with_listings(vec![
        listing("a", 450_000.0, "Casablanca", 2),
        listing("b", 520_000.0, "Casablanca", 3),
        listing("c", 610_000.0, "Casablanca", 3),
    ])))
}

/// The flow-state slots the delta model governs, serialized for exact
/// comparison. History and version move on every turn by design; the
/// slots must not move at all on a failed turn.
fn state_snapshot(conversation: &Conversation) -> String {
    serde_json::to_string(&(
        &conversation.active_agent,
        &conversation.last_listing,
        &conversation.last_results,
        &conversation.negotiation,
        &conversation.pending_alert,
    ))
    .unwrap()
}

#[tokio::test]
async fn casablanca_search_select_negotiate_scenario() {
    let stack = stack();
    let user = UserId::from("U1");

    // "Je cherche un appartement à Casablanca" → ranked list, search flow
    let fragments = stack
        .gateway
        .process_inbound(
            &user,
            InboundMessage::text("Je cherche un appartement à Casablanca"),
        )
        .await;
    let reply = fragments.concat();
    assert!(reply.contains("1."));
    assert!(reply.contains("450 000 MAD"));

    let conversation = stack.store.load(&user).await.unwrap().unwrap();
    assert_eq!(conversation.active_agent, Some(FlowAgent::Search));
    assert!(conversation.last_results.len() <= 5);
    assert!(conversation.is_consistent());

    // "Le 2 m'intéresse" → lastListingRef = 2nd item of that exact list
    let expected_second = conversation.last_results[1].id.clone();
    stack
        .gateway
        .process_inbound(&user, InboundMessage::text("Le 2 m'intéresse"))
        .await;
    let conversation = stack.store.load(&user).await.unwrap().unwrap();
    assert_eq!(conversation.last_listing, Some(expected_second));

    // "Je veux négocier" → negotiation flow, reply asks for an offer
    let fragments = stack
        .gateway
        .process_inbound(&user, InboundMessage::text("Je veux négocier"))
        .await;
    let conversation = stack.store.load(&user).await.unwrap().unwrap();
    assert_eq!(conversation.active_agent, Some(FlowAgent::Negotiation));
    assert!(fragments.concat().contains("offre"));

    // An offer below the low bound → labelled too low, range proposed
    let fragments = stack
        .gateway
        .process_inbound(&user, InboundMessage::text("je propose 300 000"))
        .await;
    let reply = fragments.concat();
    assert!(reply.contains("trop basse"));
    // Casablanca: prime-city margin, low bound = 520 000 × 0.95
    assert!(reply.contains("494 000 MAD"));
    assert!(reply.contains("520 000 MAD"));

    let conversation = stack.store.load(&user).await.unwrap().unwrap();
    assert!(conversation.is_consistent());
    assert_eq!(conversation.negotiation.unwrap().offer, Some(300_000.0));
}

#[tokio::test]
async fn out_of_range_selection_leaves_state_unchanged() {
    let stack = stack();
    let user = UserId::from("U1");
    stack
        .gateway
        .process_inbound(&user, InboundMessage::text("appartement à Casablanca"))
        .await;
    let before = state_snapshot(&stack.store.load(&user).await.unwrap().unwrap());

    let fragments = stack
        .gateway
        .process_inbound(&user, InboundMessage::text("le 9"))
        .await;
    assert!(fragments.concat().contains("entre 1 et 3"));

    let after = state_snapshot(&stack.store.load(&user).await.unwrap().unwrap());
    assert_eq!(before, after);
}

/// A search adapter that fails after a configurable number of calls.
struct FlakySearch {
    inner: CatalogSearch,
    fail_from_call: usize,
    calls: std::sync::atomic::AtomicUsize,
}

#[async_trait]
impl PropertySearch for FlakySearch {
    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<ListingSummary>, ToolError> {
        let call = self
            .calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if call >= self.fail_from_call {
            return Err(ToolError::Unavailable {
                tool: "property_search".into(),
                reason: "upstream 503".into(),
            });
        }
        self.inner.search(criteria).await
    }
}

#[tokio::test]
async fn tool_failure_commits_no_state_transition() {
    let stack = stack_with_search(Arc::new(FlakySearch {
        inner: CatalogSearch::with_listings(vec![listing("a", 450_000.0, "Casablanca", 2)]),
        fail_from_call: 1,
        calls: std::sync::atomic::AtomicUsize::new(0),
    }));
    let user = UserId::from("U1");

    // First search succeeds and establishes flow state
    stack
        .gateway
        .process_inbound(&user, InboundMessage::text("appartement à Casablanca"))
        .await;
    let before = state_snapshot(&stack.store.load(&user).await.unwrap().unwrap());

    // Second search hits the failure: apology, and the flow-state slots
    // are byte-identical to their pre-turn value
    let fragments = stack
        .gateway
        .process_inbound(&user, InboundMessage::text("plutôt une villa à Rabat"))
        .await;
    assert!(fragments.concat().contains("Réessaie"));

    let conversation = stack.store.load(&user).await.unwrap().unwrap();
    assert_eq!(before, state_snapshot(&conversation));
    // The failed turn is still appended, with the failure noted
    assert!(conversation.history.last().unwrap().error.is_some());
}

#[tokio::test]
async fn legal_question_without_grounding_gets_explicit_no_answer() {
    let stack = stack();
    let user = UserId::from("U1");
    stack
        .gateway
        .process_inbound(&user, InboundMessage::text("appartement à Casablanca"))
        .await;

    let fragments = stack
        .gateway
        .process_inbound(
            &user,
            InboundMessage::text("que dit la loi sur les drones agricoles ?"),
        )
        .await;
    assert!(fragments.concat().contains("pas de réponse fiable"));

    // activeAgent unchanged from before the query
    let conversation = stack.store.load(&user).await.unwrap().unwrap();
    assert_eq!(conversation.active_agent, Some(FlowAgent::Search));
}

#[tokio::test]
async fn empty_search_alert_confirmation_is_idempotent() {
    let stack = stack();
    let user = UserId::from("U1");

    // Nothing in Oujda → alert proposed
    let fragments = stack
        .gateway
        .process_inbound(&user, InboundMessage::text("un appartement à Oujda"))
        .await;
    assert!(fragments.concat().contains("alerte"));

    // "Oui" → created
    stack
        .gateway
        .process_inbound(&user, InboundMessage::text("Oui"))
        .await;
    assert_eq!(stack.alerts.list_active(&user).await.unwrap().len(), 1);

    // Same empty search + "Oui" again → still exactly one alert
    stack
        .gateway
        .process_inbound(&user, InboundMessage::text("un appartement à Oujda"))
        .await;
    stack
        .gateway
        .process_inbound(&user, InboundMessage::text("Oui"))
        .await;
    assert_eq!(stack.alerts.list_active(&user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_identities_hold_separate_conversations() {
    let stack = Arc::new(stack());

    let tasks: Vec<_> = (0..4)
        .map(|i| {
            let stack = stack.clone();
            tokio::spawn(async move {
                let user = UserId::from(&format!("U{i}"));
                stack
                    .gateway
                    .process_inbound(&user, InboundMessage::text("appartement à Casablanca"))
                    .await;
                stack
                    .gateway
                    .process_inbound(&user, InboundMessage::text(&format!("le {}", i % 3 + 1)))
                    .await;
                user
            })
        })
        .collect();
    let users = futures::future::join_all(tasks).await;

    for (i, user) in users.into_iter().enumerate() {
        let user = user.unwrap();
        let conversation = stack.store.load(&user).await.unwrap().unwrap();
        assert_eq!(conversation.version, 2);
        let expected = conversation.last_results[i % 3].id.clone();
        assert_eq!(conversation.last_listing, Some(expected));
        assert!(conversation.is_consistent());
    }
}

#[tokio::test]
async fn deal_closes_negotiation_and_frees_the_flow() {
    let stack = stack();
    let user = UserId::from("U1");
    for text in [
        "appartement à Casablanca",
        "le 1",
        "je veux négocier",
        "440 000",
    ] {
        stack
            .gateway
            .process_inbound(&user, InboundMessage::text(text))
            .await;
    }

    let fragments = stack
        .gateway
        .process_inbound(&user, InboundMessage::text("Deal !"))
        .await;
    assert!(fragments.concat().contains("Marché conclu"));

    let conversation = stack.store.load(&user).await.unwrap().unwrap();
    assert!(conversation.active_agent.is_none());
    assert!(conversation.negotiation.is_none());
    assert!(conversation.is_consistent());
}
