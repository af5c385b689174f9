/*!
 * Resolution of pairwise comparison responses.
 *
 * The verifier prompt asks for a bare "A" or "B", but models often answer
 * with a sentence ("Translation B is better."). `RESOLUTION_CASCADE` lists
 * the heuristics in priority order; the last rule always produces a
 * verdict, so resolution never fails.
 */

use serde::{Deserialize, Serialize};

use super::alignment::truncate_response;

/// Which of the two anonymous options a response picked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    A,
    B,
}

impl Verdict {
    // @returns: Literal option token
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::A => "A",
            Verdict::B => "B",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One heuristic of the resolution cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionRule {
    /// The whole text is exactly "A" or "B"
    ExactToken,
    /// Lowercase marker pair; the earliest present marker wins
    MarkerPair {
        a: &'static str,
        b: &'static str,
    },
    /// Count of space-adjacent "A" versus "B" tokens, strictly greater wins
    SpacedTokenCount,
    /// First case-sensitive occurrence; "B" unless "A" is found first
    FirstOccurrence,
}

/// Resolution heuristics in priority order
pub const RESOLUTION_CASCADE: [ResolutionRule; 9] = [
    ResolutionRule::ExactToken,
    ResolutionRule::MarkerPair { a: "translation a", b: "translation b" },
    ResolutionRule::MarkerPair { a: "translations a", b: "translations b" },
    ResolutionRule::MarkerPair { a: "a:", b: "b:" },
    ResolutionRule::MarkerPair { a: ":a", b: ":b" },
    ResolutionRule::MarkerPair { a: "\"a\"", b: "\"b\"" },
    ResolutionRule::MarkerPair { a: "option a", b: "option b" },
    ResolutionRule::SpacedTokenCount,
    ResolutionRule::FirstOccurrence,
];

impl ResolutionRule {
    /// Apply the rule to normalized text; `None` passes to the next rule
    pub fn apply(&self, text: &str) -> Option<Verdict> {
        match self {
            ResolutionRule::ExactToken => match text {
                "A" => Some(Verdict::A),
                "B" => Some(Verdict::B),
                _ => None,
            },
            ResolutionRule::MarkerPair { a, b } => {
                let lowered = text.to_lowercase();
                match (lowered.find(a), lowered.find(b)) {
                    (Some(_), None) => Some(Verdict::A),
                    (None, Some(_)) => Some(Verdict::B),
                    (Some(pos_a), Some(pos_b)) if pos_a < pos_b => Some(Verdict::A),
                    (Some(_), Some(_)) => Some(Verdict::B),
                    (None, None) => None,
                }
            }
            ResolutionRule::SpacedTokenCount => {
                let count_a = text.matches("A ").count() + text.matches(" A").count();
                let count_b = text.matches("B ").count() + text.matches(" B").count();
                match count_a.cmp(&count_b) {
                    std::cmp::Ordering::Greater => Some(Verdict::A),
                    std::cmp::Ordering::Less => Some(Verdict::B),
                    std::cmp::Ordering::Equal => None,
                }
            }
            // A lone "A" wins here; only an absent "A" falls back to B
            ResolutionRule::FirstOccurrence => match (text.find('A'), text.find('B')) {
                (Some(pos_a), Some(pos_b)) if pos_a < pos_b => Some(Verdict::A),
                (Some(_), None) => Some(Verdict::A),
                _ => Some(Verdict::B),
            },
        }
    }
}

/// Turns free-text comparison responses into verdicts
#[derive(Debug, Clone, Default)]
pub struct VerdictResolver {
    /// End-of-turn sentinel to cut responses at
    stop_sequence: Option<String>,
}

impl VerdictResolver {
    /// Create a resolver, optionally truncating responses at a sentinel
    pub fn new(stop_sequence: Option<String>) -> Self {
        Self { stop_sequence }
    }

    /// Resolve a response to exactly one verdict
    pub fn resolve(&self, response: &str) -> Verdict {
        let text = self.normalize(response);
        RESOLUTION_CASCADE
            .iter()
            .find_map(|rule| rule.apply(&text))
            .unwrap_or(Verdict::B)
    }

    /// Truncate and keep only the non-empty trimmed lines
    fn normalize(&self, response: &str) -> String {
        let sentinels: Vec<&str> = self.stop_sequence.iter().map(String::as_str).collect();
        truncate_response(response, &sentinels)
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
