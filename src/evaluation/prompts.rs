/*!
 * Prompt templates for the three model-backed stages.
 *
 * Every prompt is a chat transcript. The evaluator uses the GEMBA-MQM
 * few-shot layout (system message, three worked examples, then the query);
 * post-editing and verification are single user turns.
 */

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::model::{ErrorAnnotation, SampleRecord};
use super::verification::ComparisonRequest;

/// One chat turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the sender (system, user or assistant)
    pub role: String,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// A full prompt sent to the inference backend
pub type Prompt = Vec<ChatMessage>;

/// System message of the error-identification prompt
pub const MQM_SYSTEM_PROMPT: &str = "You are an annotator for the quality of machine translation. Your task is to identify errors and assess the quality of the translation.";

/// Error-identification query
/// Placeholders: {source_lang}, {source_seg}, {target_lang}, {target_seg}
pub const MQM_INPUT_PROMPT: &str = "{source_lang} source:\n```{source_seg}```\n{target_lang} translation:\n```{target_seg}```\n\nBased on the source segment and machine translation surrounded with triple backticks, identify error types in the translation and classify them. The categories of errors are: accuracy (addition, mistranslation, omission, untranslated text), fluency (character encoding, grammar, inconsistency, punctuation, register, spelling), style (awkward), terminology (inappropriate for context, inconsistent use), non-translation, other, or no-error.\nEach error is classified as one of three categories: critical, major, and minor. Critical errors inhibit comprehension of the text. Major errors disrupt the flow, but what the text is trying to say is still understandable. Minor errors are technically errors, but do not disrupt the flow or hinder comprehension.";

/// Post-edit query
/// Placeholders: {source_lang}, {source_seg}, {target_lang}, {target_seg}, {error_category}, {error_content}
pub const POST_EDIT_PROMPT: &str = "{source_lang} source: \"{source_seg}\"\n{target_lang} translation: \"{target_seg}\"\nPlease post-edit the translation to address the identified error: \"{error_category} - {error_content}\". Provide only the corrected {target_lang} translation after \"Corrected Translation:\" without adding any additional explanations or translation information.";

/// Pairwise comparison query
/// Placeholders: {source_lang}, {source_seg}, {target_lang}, {transA_seg}, {transB_seg}
pub const VERIFIER_PROMPT: &str = "{source_lang} source: \"{source_seg}\"\nEvaluate the following translations:\n{target_lang} translation A: \"{transA_seg}\"\n{target_lang} translation B: \"{transB_seg}\"\nWhich translation is better? Please output either \"A\" or \"B\" only, without any additional explanation.\n\nAnswer:";

/// A worked example for the evaluator
struct FewShot {
    source_lang: &'static str,
    source_seg: &'static str,
    target_lang: &'static str,
    target_seg: &'static str,
    answer: &'static str,
}

const FEW_SHOTS: [FewShot; 3] = [
    FewShot {
        source_lang: "English",
        source_seg: "I do apologise about this, we must gain permission from the account holder to discuss an order with another person, I apologise if this was done previously, however, I would not be able to discuss this with yourself without the account holders permission.",
        target_lang: "German",
        target_seg: "Ich entschuldige mich dafür, wir müssen die Erlaubnis einholen, um eine Bestellung mit einer anderen Person zu besprechen. Ich entschuldige mich, falls dies zuvor geschehen wäre, aber ohne die Erlaubnis des Kontoinhabers wäre ich nicht in der Lage, dies mit dir involvement.",
        answer: "Critical:\nno-error\nMajor:\naccuracy/mistranslation - \"involvement\"\naccuracy/omission - \"the account holder\"\nMinor:\nfluency/grammar - \"wäre\"\nfluency/register - \"dir\"\n",
    },
    FewShot {
        source_lang: "English",
        source_seg: "Talks have resumed in Vienna to try to revive the nuclear pact, with both sides trying to gauge the prospects of success after the latest exchanges in the stop-start negotiations.",
        target_lang: "Czech",
        target_seg: "Ve Vídni se ve Vídni obnovily rozhovory o oživení jaderného paktu, přičemž obě partaje se snaží posoudit vyhlídky na úspěch po posledních výměnách v jednáních.",
        answer: "Critical:\nno-error\nMajor:\naccuracy/addition - \"ve Vídni\"\naccuracy/omission - \"the stop-start\"\nMinor:\nterminology/inappropriate for context - \"partaje\"\n",
    },
    FewShot {
        source_lang: "Chinese",
        source_seg: "大众点评乌鲁木齐家居卖场频道为您提供高铁居然之家地址，电话，营业时间等最新商户信息，找装修公司，就上大众点评",
        target_lang: "English",
        target_seg: "Urumqi Home Furnishing Store Channel provides you with the latest business information such as the address, telephone number, business hours, etc., of high-speed rail, and find a decoration company, and go to the reviews.",
        answer: "Critical:\naccuracy/addition - \"of high-speed rail\"\nMajor:\naccuracy/mistranslation - \"go to the reviews\"\nMinor:\nstyle/awkward - \"etc.,\"\n",
    },
];

static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(\w+)\}").expect("Invalid placeholder regex"));

/// Substitute `{name}` placeholders in a single pass; inserted values are never rescanned
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    PLACEHOLDER_REGEX
        .replace_all(template, |caps: &Captures| {
            vars.iter()
                .find(|(name, _)| *name == &caps[1])
                .map_or_else(|| caps[0].to_string(), |(_, value)| value.to_string())
        })
        .into_owned()
}

/// Builds prompts for each pipeline stage
pub struct PromptBuilder;

impl PromptBuilder {
    /// Few-shot error-identification prompt for one sample
    pub fn evaluator(sample: &SampleRecord) -> Prompt {
        let mut prompt = vec![ChatMessage::system(MQM_SYSTEM_PROMPT)];

        for shot in FEW_SHOTS.iter() {
            prompt.push(ChatMessage::user(render(
                MQM_INPUT_PROMPT,
                &[
                    ("source_lang", shot.source_lang),
                    ("source_seg", shot.source_seg),
                    ("target_lang", shot.target_lang),
                    ("target_seg", shot.target_seg),
                ],
            )));
            prompt.push(ChatMessage::assistant(shot.answer));
        }

        prompt.push(ChatMessage::user(render(
            MQM_INPUT_PROMPT,
            &[
                ("source_lang", &sample.source_lang),
                ("source_seg", &sample.source_seg),
                ("target_lang", &sample.target_lang),
                ("target_seg", &sample.target_seg),
            ],
        )));

        prompt
    }

    /// Post-edit prompt addressing one annotation
    pub fn post_edit(sample: &SampleRecord, annotation: &ErrorAnnotation) -> Prompt {
        vec![ChatMessage::user(render(
            POST_EDIT_PROMPT,
            &[
                ("source_lang", &sample.source_lang),
                ("source_seg", &sample.source_seg),
                ("target_lang", &sample.target_lang),
                ("target_seg", &sample.target_seg),
                ("error_category", &annotation.category),
                ("error_content", &annotation.span),
            ],
        ))]
    }

    /// Pairwise comparison prompt
    pub fn verifier(request: &ComparisonRequest) -> Prompt {
        vec![ChatMessage::user(render(
            VERIFIER_PROMPT,
            &[
                ("source_lang", &request.source_lang),
                ("source_seg", &request.source_seg),
                ("target_lang", &request.target_lang),
                ("transA_seg", &request.translation_a),
                ("transB_seg", &request.translation_b),
            ],
        ))]
    }
}
