//! Demo data for the interactive CLI: a small property catalog and the
//! legal corpus chunks. In a deployment both come from the ingestion
//! pipeline (scraped listings, indexed legal documents).

use chrono::{Duration, Utc};
use riad_core::listing::{ListingId, ListingSummary, TransactionKind};
use riad_tools::legal::Passage;

fn listing(
    id: &str,
    title: &str,
    location: &str,
    price: f64,
    transaction: TransactionKind,
    property_type: &str,
    bedrooms: u32,
    surface: f64,
    image_token: &str,
    days_old: i64,
) -> ListingSummary {
    ListingSummary {
        id: ListingId::from(id),
        title: title.into(),
        location: location.into(),
        price,
        transaction,
        property_type: property_type.into(),
        bedrooms,
        surface: Some(surface),
        image_token: Some(image_token.into()),
        posted_at: Utc::now() - Duration::days(days_old),
    }
}

pub fn sample_listings() -> Vec<ListingSummary> {
    vec![
        listing(
            "cs-001",
            "Appartement lumineux Maârif",
            "Maârif, Casablanca",
            850_000.0,
            TransactionKind::Sale,
            "appartement",
            2,
            95.0,
            "appartement moderne balcon",
            3,
        ),
        listing(
            "cs-002",
            "Appartement standing Gauthier",
            "Gauthier, Casablanca",
            1_250_000.0,
            TransactionKind::Sale,
            "appartement",
            3,
            130.0,
            "appartement standing ascenseur",
            10,
        ),
        listing(
            "cs-003",
            "Studio proche tramway",
            "Casablanca",
            4_500.0,
            TransactionKind::Rent,
            "studio",
            1,
            45.0,
            "studio meublé",
            1,
        ),
        listing(
            "rb-001",
            "Appartement vue sur le Bouregreg",
            "Hassan, Rabat",
            990_000.0,
            TransactionKind::Sale,
            "appartement",
            3,
            110.0,
            "appartement terrasse vue",
            6,
        ),
        listing(
            "rb-002",
            "Duplex neuf Hay Riad",
            "Hay Riad, Rabat",
            1_600_000.0,
            TransactionKind::Sale,
            "duplex",
            4,
            170.0,
            "duplex neuf moderne",
            15,
        ),
        listing(
            "mk-001",
            "Villa avec piscine route de Fès",
            "Marrakech",
            3_200_000.0,
            TransactionKind::Sale,
            "villa",
            5,
            340.0,
            "villa piscine jardin palmiers",
            8,
        ),
        listing(
            "mk-002",
            "Riad rénové médina",
            "Médina, Marrakech",
            2_100_000.0,
            TransactionKind::Sale,
            "riad",
            4,
            210.0,
            "riad traditionnel patio zellige",
            21,
        ),
        listing(
            "tg-001",
            "Appartement front de mer",
            "Malabata, Tanger",
            7_500.0,
            TransactionKind::Rent,
            "appartement",
            2,
            85.0,
            "appartement mer vue balcon",
            2,
        ),
    ]
}

/// A fresh listing for the `/ingest` command, timestamped now so it
/// ranks as the most recent at its price point.
pub fn ingested_listing(location: &str, price: f64) -> ListingSummary {
    let id = format!("in-{}", Utc::now().timestamp_millis());
    ListingSummary {
        id: ListingId::from(&id),
        title: format!("Appartement {location}"),
        location: location.into(),
        price,
        transaction: TransactionKind::Sale,
        property_type: "appartement".into(),
        bedrooms: 2,
        surface: Some(80.0),
        image_token: None,
        posted_at: Utc::now(),
    }
}

pub fn legal_corpus() -> Vec<Passage> {
    vec![
        Passage::new(
            "Les frais de notaire pour une acquisition immobilière représentent environ \
             6 à 7% du prix d'achat : droits d'enregistrement, conservation foncière et \
             honoraires du notaire.",
            "frais_acquisition.md",
        ),
        Passage::new(
            "Le bail d'habitation prévoit un préavis de trois mois pour le locataire et \
             une augmentation de loyer plafonnée entre deux révisions.",
            "bail_habitation.md",
        ),
        Passage::new(
            "La loi 18-00 régit la copropriété des immeubles bâtis : droits et devoirs \
             des copropriétaires, rôle du syndic, assemblée générale annuelle.",
            "copropriete.md",
        ),
        Passage::new(
            "L'achat par un étranger est possible pour les biens à usage d'habitation, \
             mais pas pour les terres agricoles ; le transfert de fonds doit être déclaré \
             à l'Office des Changes pour garantir le rapatriement.",
            "achat_etrangers.md",
        ),
        Passage::new(
            "L'inscription au titre foncier auprès de la conservation foncière offre la \
             sécurité juridique maximale : le titre est inattaquable une fois inscrit.",
            "titre_foncier.md",
        ),
        Passage::new(
            "En VEFA (vente en l'état futur d'achèvement), le promoteur doit fournir une \
             garantie d'achèvement et l'acheteur paie par échelonnement suivant \
             l'avancement des travaux.",
            "vefa.md",
        ),
    ]
}
