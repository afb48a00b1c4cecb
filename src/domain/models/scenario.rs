use serde::{Deserialize, Serialize};

/// Key of the scenario used when a caller names none, or names one the
/// registry does not know.
pub const DEFAULT_SCENARIO: &str = "default";

/// Sampling temperature used when neither the caller nor the scenario sets one.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// A named (system prompt, temperature) pair selecting the model's framing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    key: String,
    name: String,
    system_prompt: String,
    temperature: f32,
}

impl Scenario {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            system_prompt: system_prompt.into(),
            temperature,
        }
    }

    /// Scenario used when the registry has no `default` entry either.
    pub fn fallback() -> Self {
        Self::new(
            DEFAULT_SCENARIO,
            "Smart assistant",
            DEFAULT_PROMPT,
            DEFAULT_TEMPERATURE,
        )
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn summary(&self) -> ScenarioSummary {
        ScenarioSummary {
            key: self.key.clone(),
            name: self.name.clone(),
            temperature: self.temperature,
        }
    }
}

/// The list-all view of a scenario: everything except the prompt text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub key: String,
    pub name: String,
    pub temperature: f32,
}

const DEFAULT_PROMPT: &str = "\
You are a smart and helpful AI assistant.
Answer questions clearly, accurately and in a friendly tone.";

const CUSTOMER_SUPPORT_PROMPT: &str = "\
You are a professional customer support agent.
Your job:
- Always be polite and friendly
- Resolve problems quickly
- Give concrete step-by-step instructions
- Always ask whether the customer needs anything else

Answer format:
1. Polite greeting
2. Restate the problem
3. Detailed solution
4. Confirm the customer understood";

const TEACHER_PROMPT: &str = "\
You are an experienced teacher.
When explaining:
- Use simple, easy-to-understand language
- Give concrete examples
- Break complex knowledge into small pieces
- Encourage the student to ask questions

Answer format:
1. Explain the basic concept
2. Give an illustrating example
3. Summarize the key points
4. Suggest a practice exercise (when it fits)";

const SALES_PROMPT: &str = "\
You are a professional sales consultant.
Working style:
- Enthusiastic but never pushy
- Understand the customer's needs
- Offer suitable suggestions
- Highlight product benefits
- Answer every question

Consultation format:
1. Greet and discover needs
2. Introduce a suitable product
3. State benefits and strengths
4. Answer questions
5. Call to action (buy / learn more)";

const TECHNICAL_PROMPT: &str = "\
You are an IT expert with deep experience.
When answering:
- Explain in detail and precisely
- Give code examples when needed
- Explain the \"why\" as well
- Recommend best practices
- Warn about common mistakes

Answer format:
1. Explain the problem
2. Give the solution (with code when needed)
3. Explain how it works
4. Tips and caveats";

const CREATIVE_PROMPT: &str = "\
You are a content creation expert.
Style:
- Creative and original
- Vivid, engaging language
- Captivating storytelling
- Rich vocabulary

When creating content:
1. Open with a strong hook
2. Develop ideas logically
3. Use vivid imagery
4. End memorably";

/// Scenarios every registry starts with.
pub fn builtin_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new(DEFAULT_SCENARIO, "Smart assistant", DEFAULT_PROMPT, 0.7),
        Scenario::new(
            "customer_support",
            "Customer support",
            CUSTOMER_SUPPORT_PROMPT,
            0.5,
        ),
        Scenario::new("teacher", "Teacher", TEACHER_PROMPT, 0.6),
        Scenario::new("sales", "Sales consultant", SALES_PROMPT, 0.7),
        Scenario::new("technical", "Technical expert", TECHNICAL_PROMPT, 0.4),
        Scenario::new("creative", "Content creator", CREATIVE_PROMPT, 0.9),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_include_default_with_unique_keys() {
        let scenarios = builtin_scenarios();
        assert!(scenarios.iter().any(|s| s.key() == DEFAULT_SCENARIO));

        let mut keys: Vec<&str> = scenarios.iter().map(|s| s.key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), scenarios.len());
    }

    #[test]
    fn summary_drops_prompt() {
        let scenario = Scenario::new("x", "Name", "prompt", 0.3);
        let summary = scenario.summary();
        assert_eq!(summary.key, "x");
        assert_eq!(summary.name, "Name");
        assert_eq!(summary.temperature, 0.3);
    }
}
