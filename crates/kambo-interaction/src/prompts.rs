//! Prompt templates for the three generation-backed stages.
//!
//! Wording is content, not logic; the stages only rely on the answer
//! formats the templates ask for (YES/NO, SAFE/MEDICAL_ADVICE).

use minijinja::{Environment, context};

const TOPIC_TEMPLATE: &str = "topic";
const RESPONDER_TEMPLATE: &str = "responder";
const VERIFIER_TEMPLATE: &str = "verifier";

const TOPIC_SOURCE: &str = r#"You are a content classifier. Determine if a question is related to the following domain:

{{ domain_definition }}

Respond with 'YES' if the question is related, or 'NO' if it is not.

Question: {{ question }}"#;

const RESPONDER_SOURCE: &str = r#"You are a knowledgeable assistant specializing in Kambo ceremonies and traditional Amazonian medicine.

Your role is to provide educational information about:
- Traditional Kambo practices and ceremonies
- Cultural and historical context
- Safety considerations and contraindications
- Research and scientific studies
- Legal and ethical considerations

IMPORTANT GUIDELINES:
1. Provide educational information only
2. Never give medical advice, diagnoses, treatment recommendations or dosages
3. Never claim that anything cures or heals a condition
4. Direct users to qualified healthcare providers for medical questions
5. Be respectful of indigenous knowledge and practices
{% if context %}
Background information:
{{ context }}
{% endif %}{% if feedback %}
Your previous answer was rejected. Avoid these issues:
{{ feedback }}
{% endif %}
User question: {{ question }}

Please provide educational information about this aspect of Kambo:"#;

const VERIFIER_SOURCE: &str = r#"You are a medical compliance reviewer. Check whether the response below contains medical advice.

Medical advice includes diagnosing conditions, recommending treatments, stating dosages, claiming cures, or promising healing.

If the response is purely educational, answer with exactly: SAFE
Otherwise answer with MEDICAL_ADVICE followed by every category that applies from: DIAGNOSIS, TREATMENT, DOSAGE, CURE, HEAL
Never use the word UNSAFE.

Original question: {{ question }}

Response to verify:
{{ response }}"#;

/// Compiled prompt templates.
pub struct PromptLibrary {
    env: Environment<'static>,
}

impl PromptLibrary {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(TOPIC_TEMPLATE, TOPIC_SOURCE)?;
        env.add_template(RESPONDER_TEMPLATE, RESPONDER_SOURCE)?;
        env.add_template(VERIFIER_TEMPLATE, VERIFIER_SOURCE)?;
        Ok(Self { env })
    }

    /// YES/NO classification prompt.
    pub fn topic_prompt(
        &self,
        question: &str,
        domain_definition: &str,
    ) -> Result<String, minijinja::Error> {
        self.env
            .get_template(TOPIC_TEMPLATE)?
            .render(context! { question, domain_definition })
    }

    /// Answer prompt; `feedback` switches to the enhanced retry wording.
    pub fn responder_prompt(
        &self,
        question: &str,
        context: Option<&str>,
        feedback: Option<&str>,
    ) -> Result<String, minijinja::Error> {
        let context = context.filter(|c| !c.trim().is_empty());
        let feedback = feedback.filter(|f| !f.trim().is_empty());
        self.env
            .get_template(RESPONDER_TEMPLATE)?
            .render(context! { question, context, feedback })
    }

    /// SAFE / MEDICAL_ADVICE compliance prompt.
    pub fn verifier_prompt(&self, question: &str, response: &str) -> Result<String, minijinja::Error> {
        self.env
            .get_template(VERIFIER_TEMPLATE)?
            .render(context! { question, response })
    }
}
