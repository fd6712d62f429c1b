use serde::{Deserialize, Serialize};

use super::Connections;
use crate::catalog::{Book, Genre};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commentary {
    pub title: String,
    pub description: String,
}

impl Commentary {
    fn new(title: &str, description: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            description: description.into(),
        }
    }
}

const RAPID_SYNTHESIS: &str = "LLMs can process and synthesize connections across large text corpora in seconds, enabling exploratory research at unprecedented speeds.";

const LIMITATIONS_BEFORE_POETRY: [(&str, &str); 4] = [
    (
        "Cultural Nuance and Context",
        "LLMs may miss culturally-specific rhetorical strategies, particularly those rooted in oral traditions, code-switching, or community-specific language practices prevalent in Latino women's rhetoric.",
    ),
    (
        "Translingual Complexities",
        "While detecting some linguistic patterns, LLMs may struggle with the full complexity of translingual practices, including Spanglish, indigenous language influences, and the political dimensions of language choice.",
    ),
    (
        "Embodied Knowledge",
        "Texts about the body and embodied experiences may resist computational analysis, as LLMs lack lived experience and may reduce complex embodied rhetoric to surface-level patterns.",
    ),
    (
        "Rhetorical Listening",
        "True rhetorical listening requires openness to difference and standing under discourse. LLMs process text but cannot engage in the ethical, relational practice of listening across cultural and linguistic differences.",
    ),
];

const POETRY_LIMITATION: (&str, &str) = (
    "Poetic and Aesthetic Dimensions",
    "Poetry's aesthetic elements\u{2014}sound, rhythm, silences, and visual arrangement\u{2014}resist computational analysis, limiting LLM understanding of poetic rhetoric.",
);

const LIMITATIONS_AFTER_POETRY: [(&str, &str); 2] = [
    (
        "Historical Trauma and Memory",
        "LLMs may identify themes of trauma but cannot fully comprehend the intergenerational, somatic, and communal dimensions of historical trauma in diasporic and colonized communities.",
    ),
    (
        "Multimodal Meaning-Making",
        "Many Latino women's texts employ multimodal strategies (visual, gestural, spatial) that are lost in text-only computational analysis.",
    ),
];

pub fn identify_enhancements(connections: &Connections) -> Vec<Commentary> {
    let mut enhancements = Vec::new();

    if !connections.themes.is_empty() {
        enhancements.push(Commentary::new(
            "Thematic Pattern Recognition",
            format!(
                "LLMs excel at identifying {} thematic connections across selected texts, revealing patterns that might not be immediately apparent to human readers.",
                connections.themes.len()
            ),
        ));
    }

    if !connections.theories.is_empty() {
        enhancements.push(Commentary::new(
            "Theoretical Framework Mapping",
            "Successfully mapped theoretical frameworks across multiple texts, demonstrating LLMs' ability to recognize scholarly discourse patterns.",
        ));
    }

    if let Some(temporal) = &connections.temporal {
        enhancements.push(Commentary::new(
            "Historical Contextualization",
            format!(
                "LLMs can quickly aggregate temporal data spanning {}, providing instant historical context across a century of Latino women's rhetoric.",
                temporal.time_span_label()
            ),
        ));
    }

    if connections.geographic.len() > 1 {
        enhancements.push(Commentary::new(
            "Transnational Analysis",
            format!(
                "Identified connections across {} countries, highlighting LLMs' capacity for transnational comparative analysis.",
                connections.geographic.len()
            ),
        ));
    }

    enhancements.push(Commentary::new("Rapid Synthesis", RAPID_SYNTHESIS));
    enhancements
}

pub fn identify_limitations(books: &[Book]) -> Vec<Commentary> {
    let mut limitations: Vec<Commentary> = LIMITATIONS_BEFORE_POETRY
        .iter()
        .map(|(title, description)| Commentary::new(title, *description))
        .collect();

    if books.iter().any(|book| book.genre == Genre::Poetry) {
        let (title, description) = POETRY_LIMITATION;
        limitations.push(Commentary::new(title, description));
    }

    limitations.extend(
        LIMITATIONS_AFTER_POETRY
            .iter()
            .map(|(title, description)| Commentary::new(title, *description)),
    );
    limitations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Connection;
    use crate::analysis::temporal::analyze_temporal;
    use crate::catalog::tests::book;

    fn titles(items: &[Commentary]) -> Vec<&str> {
        items.iter().map(|item| item.title.as_str()).collect()
    }

    #[test]
    fn empty_connections_only_get_rapid_synthesis() {
        let enhancements = identify_enhancements(&Connections::default());
        assert_eq!(titles(&enhancements), vec!["Rapid Synthesis"]);
    }

    #[test]
    fn every_trigger_fires_in_order() {
        let connections = Connections {
            themes: vec![Connection {
                term: "memory".to_string(),
                book: "Silent Dancing".to_string(),
                author: "Judith Ortiz Cofer".to_string(),
            }],
            theories: vec![Connection {
                term: "Rhetorical Listening".to_string(),
                book: "Silent Dancing".to_string(),
                author: "Judith Ortiz Cofer".to_string(),
            }],
            temporal: analyze_temporal(&[1900, 1990]),
            geographic: vec!["Chile".to_string(), "Mexico".to_string()],
            ..Default::default()
        };
        let enhancements = identify_enhancements(&connections);
        assert_eq!(
            titles(&enhancements),
            vec![
                "Thematic Pattern Recognition",
                "Theoretical Framework Mapping",
                "Historical Contextualization",
                "Transnational Analysis",
                "Rapid Synthesis",
            ]
        );
        assert!(enhancements[0].description.contains("identifying 1 thematic"));
        assert!(enhancements[2].description.contains("spanning 90 years"));
        assert!(enhancements[3].description.contains("across 2 countries"));
    }

    #[test]
    fn single_country_is_not_transnational() {
        let connections = Connections {
            geographic: vec!["Mexico".to_string()],
            ..Default::default()
        };
        let enhancements = identify_enhancements(&connections);
        assert!(!titles(&enhancements).contains(&"Transnational Analysis"));
    }

    #[test]
    fn poetry_adds_aesthetic_limitation_before_trauma() {
        let prose = identify_limitations(&[book(1, 1990, "USA", Genre::History)]);
        assert_eq!(prose.len(), 6);
        assert!(!titles(&prose).contains(&"Poetic and Aesthetic Dimensions"));

        let poetry = identify_limitations(&[
            book(1, 1990, "USA", Genre::History),
            book(2, 1922, "Chile", Genre::Poetry),
        ]);
        assert_eq!(poetry.len(), 7);
        assert_eq!(poetry[4].title, "Poetic and Aesthetic Dimensions");
        assert_eq!(poetry[5].title, "Historical Trauma and Memory");
        assert_eq!(poetry[6].title, "Multimodal Meaning-Making");
    }
}
