//! French free-text heuristics shared by the agents.
//!
//! No NLP here: amounts, positional selections ("le 2", "la première"),
//! yes/no words, and structured search criteria are extracted with plain
//! token scanning. Messages come from a chat transport, so they are short
//! and the vocabulary is narrow.

use riad_core::listing::{SearchCriteria, TransactionKind};

/// Cities recognized in queries, longest first so "casablanca" wins
/// over the "casa" shorthand.
pub const CITIES: &[&str] = &[
    "casablanca",
    "mohammedia",
    "essaouira",
    "marrakech",
    "bouskoura",
    "kénitra",
    "kenitra",
    "meknès",
    "meknes",
    "agadir",
    "tanger",
    "rabat",
    "oujda",
    "salé",
    "fès",
    "fes",
    "casa",
];

/// Property categories recognized in queries.
pub const PROPERTY_TYPES: &[&str] = &[
    "appartement",
    "appart",
    "villa",
    "maison",
    "studio",
    "terrain",
    "bureau",
    "local",
    "duplex",
    "riad",
];

/// Lowercase the text and split into alphanumeric words (accents kept).
fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether any of `keywords` appears in the text. Single words match
/// tokens exactly, or by prefix when the keyword is long enough to be
/// unambiguous ("chambre" matches "chambres", but "loi" does not match
/// "loin"). Keywords with punctuation or spaces ("d'accord",
/// "contre-offre", "au revoir") match by substring.
pub fn mentions_any(text: &str, keywords: &[&str]) -> bool {
    count_mentions(text, keywords) > 0
}

/// Count how many of `keywords` appear in the text.
pub fn count_mentions(text: &str, keywords: &[&str]) -> usize {
    let lower = text.to_lowercase();
    let tokens = words(text);
    keywords
        .iter()
        .filter(|kw| {
            if kw.chars().any(|c| !c.is_alphanumeric()) {
                lower.contains(*kw)
            } else {
                tokens
                    .iter()
                    .any(|t| t == *kw || (kw.chars().count() >= 5 && t.starts_with(*kw)))
            }
        })
        .count()
}

/// Extract the first monetary amount from the text.
///
/// Understands grouped thousands ("850 000", "1.200.000"), decimal
/// commas ("8500,50") and the "k" / "mille" / "million" multipliers.
/// Returns `None` when no digit appears at all.
pub fn parse_amount(text: &str) -> Option<f64> {
    let chars: Vec<char> = text.chars().collect();
    let mut i = chars.iter().position(|c| c.is_ascii_digit())?;

    let mut run = String::new();
    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_digit() {
            run.push(c);
            i += 1;
        } else if matches!(c, ' ' | '\u{a0}' | '.' | ',')
            && i + 1 < chars.len()
            && chars[i + 1].is_ascii_digit()
        {
            run.push(c);
            i += 1;
        } else {
            break;
        }
    }

    let mut value = normalize_number(&run)?;

    // Multiplier: attached ("900k") or as the next word ("2 millions")
    let rest: String = chars[i..].iter().collect();
    let rest = rest.trim_start();
    let next_word: String = rest
        .chars()
        .take_while(|c| c.is_alphabetic())
        .collect::<String>()
        .to_lowercase();
    if next_word.starts_with("million") {
        value *= 1_000_000.0;
    } else if next_word == "k" || next_word.starts_with("mille") {
        value *= 1_000.0;
    }

    Some(value)
}

/// Parse a digit run with mixed separators into a number.
fn normalize_number(raw: &str) -> Option<f64> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    let parts: Vec<&str> = compact.split('.').collect();
    let joined = if parts.len() > 1 {
        let last = parts[parts.len() - 1];
        let groups_of_three = parts[1..parts.len() - 1].iter().all(|p| p.len() == 3);
        if last.len() <= 2 && groups_of_three {
            // Decimal tail, possibly after grouped thousands
            format!("{}.{}", parts[..parts.len() - 1].concat(), last)
        } else {
            // Pure grouping ("1.200.000") or ambiguous — join everything
            parts.concat()
        }
    } else {
        compact
    };

    joined.parse().ok()
}

const ORDINALS: &[(&str, usize)] = &[
    ("premier", 1),
    ("première", 1),
    ("1er", 1),
    ("deuxième", 2),
    ("second", 2),
    ("seconde", 2),
    ("troisième", 3),
    ("quatrième", 4),
    ("cinquième", 5),
];

/// Extract a positional selection ("le 2", "numéro 3", "la première",
/// a bare "2"). Returns the 1-indexed position without bounds checking —
/// the caller decides what an out-of-range pick means.
pub fn parse_selection(text: &str) -> Option<usize> {
    let tokens = words(text);

    for (word, position) in ORDINALS {
        if tokens.iter().any(|t| t == word) {
            return Some(*position);
        }
    }

    // "2ème" / "3eme"
    for t in &tokens {
        if let Some(stripped) = t.strip_suffix("ème").or_else(|| t.strip_suffix("eme")) {
            if let Ok(n) = stripped.parse::<usize>() {
                return Some(n);
            }
        }
    }

    // A small number after a selection cue, or standing alone
    for (i, t) in tokens.iter().enumerate() {
        let Ok(n) = t.parse::<usize>() else { continue };
        if n == 0 || n > 20 {
            continue;
        }
        let cued = i > 0
            && matches!(
                tokens[i - 1].as_str(),
                "le" | "la" | "numéro" | "numero" | "n" | "option" | "choix" | "alerte"
            );
        if cued || tokens.len() == 1 {
            return Some(n);
        }
    }

    None
}

const AFFIRMATIVE: &[&str] = &["oui", "ouais", "yes", "ok", "d'accord", "daccord", "parfait", "volontiers"];
const NEGATIVE: &[&str] = &["non", "no", "nope", "pas maintenant"];
const DEAL: &[&str] = &["deal", "vendu", "j'accepte", "accepte", "marché conclu", "ça marche"];

pub fn is_affirmative(text: &str) -> bool {
    mentions_any(text, AFFIRMATIVE)
}

pub fn is_negative(text: &str) -> bool {
    mentions_any(text, NEGATIVE)
}

pub fn is_deal(text: &str) -> bool {
    mentions_any(text, DEAL)
}

/// Explicit reset command — wipes the active flow.
pub fn is_reset(text: &str) -> bool {
    mentions_any(text, &["reset", "recommencer", "recommence", "repartir de zéro"])
}

/// Extract structured search criteria from free text.
pub fn parse_criteria(text: &str) -> SearchCriteria {
    let lower = text.to_lowercase();
    let mut criteria = SearchCriteria::default();

    for city in CITIES {
        if lower.contains(city) {
            let canonical = if *city == "casa" { "casablanca" } else { city };
            criteria.location = Some(canonical.to_string());
            break;
        }
    }

    for kind in PROPERTY_TYPES {
        if mentions_any(&lower, &[kind]) {
            let canonical = if *kind == "appart" { "appartement" } else { kind };
            criteria.property_type = Some(canonical.to_string());
            break;
        }
    }

    if mentions_any(
        &lower,
        &["louer", "location", "loue", "mensuel", "par mois"],
    ) {
        criteria.transaction = Some(TransactionKind::Rent);
    } else if mentions_any(&lower, &["acheter", "achat", "vente", "vendre", "vends"]) {
        criteria.transaction = Some(TransactionKind::Sale);
    }

    parse_numeric_constraints(&lower, &mut criteria);
    criteria
}

/// Classify each number in the text as a bedroom count, a budget bound,
/// or noise, based on the words around it.
fn parse_numeric_constraints(lower: &str, criteria: &mut SearchCriteria) {
    let tokens: Vec<&str> = lower
        .split(|c: char| c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();

    let mut i = 0;
    while i < tokens.len() {
        let Some(amount) = parse_amount(tokens[i]) else {
            i += 1;
            continue;
        };

        // Grouped thousands span several tokens ("850 000"); swallow them
        let mut end = i + 1;
        while end < tokens.len() && tokens[end].chars().all(|c| c.is_ascii_digit()) {
            end += 1;
        }
        let span: String = tokens[i..end].join(" ");
        let amount = parse_amount(&span).unwrap_or(amount);

        // Multiplier word right after the digits
        let mut amount = amount;
        if end < tokens.len() {
            let next = tokens[end].trim_matches(|c: char| !c.is_alphabetic());
            if next.starts_with("million") {
                amount *= 1_000_000.0;
                end += 1;
            } else if next == "k" || next.starts_with("mille") {
                amount *= 1_000.0;
                end += 1;
            }
        }

        let following = tokens.get(end).copied().unwrap_or("");
        let is_bedroom = following.starts_with("chambre")
            || following.starts_with("pièce")
            || following.starts_with("piece")
            || following == "ch";

        if is_bedroom {
            criteria.bedrooms = Some(amount as u32);
            i = end + 1;
            continue;
        }

        let window_start = i.saturating_sub(3);
        let before = tokens[window_start..i].join(" ");
        if before.contains("moins") || before.contains("max") || before.contains("jusqu") || before.contains("plafond") || before.contains("budget") {
            criteria.max_price = Some(amount);
        } else if before.contains("plus de") || before.contains("minimum") || before.contains("partir") {
            criteria.min_price = Some(amount);
        } else if before.contains("entre") {
            criteria.min_price = Some(amount);
        } else if before.contains("et") && criteria.min_price.is_some() && criteria.max_price.is_none() {
            criteria.max_price = Some(amount);
        } else if amount >= 5_000.0 && criteria.max_price.is_none() {
            // A bare large number in a property query is a budget ceiling
            criteria.max_price = Some(amount);
        }

        i = end;
    }

    // "entre X et Y" with X > Y never makes sense; swap defensively
    if let (Some(min), Some(max)) = (criteria.min_price, criteria.max_price) {
        if min > max {
            criteria.min_price = Some(max);
            criteria.max_price = Some(min);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_plain() {
        assert_eq!(parse_amount("je propose 850000"), Some(850_000.0));
    }

    #[test]
    fn amount_grouped_with_spaces() {
        assert_eq!(parse_amount("850 000 MAD"), Some(850_000.0));
    }

    #[test]
    fn amount_grouped_with_dots() {
        assert_eq!(parse_amount("1.200.000 dh"), Some(1_200_000.0));
    }

    #[test]
    fn amount_decimal_comma() {
        assert_eq!(parse_amount("7500,50"), Some(7_500.5));
    }

    #[test]
    fn amount_k_suffix() {
        assert_eq!(parse_amount("900k"), Some(900_000.0));
        assert_eq!(parse_amount("900 k"), Some(900_000.0));
    }

    #[test]
    fn amount_millions_word() {
        assert_eq!(parse_amount("1 million"), Some(1_000_000.0));
        assert_eq!(parse_amount("2 millions de dirhams"), Some(2_000_000.0));
    }

    #[test]
    fn amount_absent() {
        assert_eq!(parse_amount("je cherche un appartement"), None);
    }

    #[test]
    fn selection_le_n() {
        assert_eq!(parse_selection("Le 2 m'intéresse"), Some(2));
        assert_eq!(parse_selection("je veux le 3"), Some(3));
    }

    #[test]
    fn selection_ordinal_words() {
        assert_eq!(parse_selection("le premier"), Some(1));
        assert_eq!(parse_selection("la première option"), Some(1));
        assert_eq!(parse_selection("le deuxième"), Some(2));
        assert_eq!(parse_selection("2ème"), Some(2));
    }

    #[test]
    fn selection_bare_number() {
        assert_eq!(parse_selection("3"), Some(3));
    }

    #[test]
    fn selection_numero() {
        assert_eq!(parse_selection("numéro 4 stp"), Some(4));
    }

    #[test]
    fn selection_ignores_large_numbers() {
        assert_eq!(parse_selection("mon budget est 850000"), None);
    }

    #[test]
    fn selection_absent() {
        assert_eq!(parse_selection("je cherche un appartement"), None);
    }

    #[test]
    fn affirmative_and_negative() {
        assert!(is_affirmative("Oui !"));
        assert!(is_affirmative("ok d'accord"));
        assert!(is_negative("non merci"));
        assert!(!is_affirmative("je cherche à Oujda"));
    }

    #[test]
    fn deal_words() {
        assert!(is_deal("Deal !"));
        assert!(is_deal("marché conclu"));
        assert!(!is_deal("je réfléchis"));
    }

    #[test]
    fn word_boundary_guards_short_keywords() {
        // "loi" must not fire inside "loin"
        assert!(!mentions_any("c'est loin d'ici", &["loi"]));
        assert!(mentions_any("que dit la loi ?", &["loi"]));
        // long keywords match by prefix
        assert!(mentions_any("je veux négocier", &["négoc"]));
    }

    #[test]
    fn criteria_full_query() {
        let c = parse_criteria("Je cherche un appartement à louer à Casablanca, 2 chambres, moins de 9000 dh");
        assert_eq!(c.location.as_deref(), Some("casablanca"));
        assert_eq!(c.property_type.as_deref(), Some("appartement"));
        assert_eq!(c.transaction, Some(TransactionKind::Rent));
        assert_eq!(c.bedrooms, Some(2));
        assert_eq!(c.max_price, Some(9_000.0));
    }

    #[test]
    fn criteria_casa_shorthand() {
        let c = parse_criteria("une villa sur Casa");
        assert_eq!(c.location.as_deref(), Some("casablanca"));
        assert_eq!(c.property_type.as_deref(), Some("villa"));
    }

    #[test]
    fn criteria_budget_range() {
        let c = parse_criteria("entre 500 000 et 700 000 MAD à Rabat");
        assert_eq!(c.min_price, Some(500_000.0));
        assert_eq!(c.max_price, Some(700_000.0));
        assert_eq!(c.location.as_deref(), Some("rabat"));
    }

    #[test]
    fn criteria_bare_amount_is_ceiling() {
        let c = parse_criteria("un studio à Agadir 6000 dh");
        assert_eq!(c.max_price, Some(6_000.0));
        assert_eq!(c.bedrooms, None);
    }

    #[test]
    fn criteria_bedrooms_not_budget() {
        let c = parse_criteria("3 chambres à Tanger");
        assert_eq!(c.bedrooms, Some(3));
        assert_eq!(c.max_price, None);
    }

    #[test]
    fn criteria_sale_keywords() {
        let c = parse_criteria("acheter une maison à Fès");
        assert_eq!(c.transaction, Some(TransactionKind::Sale));
        assert_eq!(c.location.as_deref(), Some("fès"));
    }

    #[test]
    fn criteria_empty_on_smalltalk() {
        let c = parse_criteria("bonjour ça va ?");
        assert!(c.is_empty());
    }
}
