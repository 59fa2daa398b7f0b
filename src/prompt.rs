/// The phrase the model is asked to end its review with.
pub const HEALTH_SCORE_LABEL: &str = "SwiftPM Health Score";

const PERSONA: &str = "You are a senior Apple tools engineer with deep expertise in Swift Package
Manager (SwiftPM). You've been asked to review a Swift package configuration
for structure, clarity, and best practices.";

const INSTRUCTIONS: &[&str] = &[
    "Identify potential problems or omissions.",
    "Recommend improvements for modularity, platform support, testing, or\nplugins.",
    "Suggest missing metadata such as descriptions or platform declarations.",
    "Use markdown-style formatting and a kind, professional tone.",
    "Conclude with a 'SwiftPM Health Score' out of 100.\n   Like 'SwiftPM Health Score: 28/100'",
    "Dont speak in the first person.",
];

/// Build the review prompt. The manifest is embedded verbatim.
pub fn create_review_prompt(manifest: &str) -> String {
    let mut prompt = String::with_capacity(manifest.len() + 1024);
    prompt.push('\n');
    prompt.push_str(PERSONA);
    prompt.push_str("\n\nPlease:\n");
    for (i, instruction) in INSTRUCTIONS.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, instruction));
    }
    prompt.push_str("\nHere is the Swift package:\n\n");
    prompt.push_str(manifest);
    prompt.push_str("\n\nNow, provide your analysis.\n");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"// swift-tools-version:5.9
import PackageDescription

let package = Package(name: "MujaTools")"#;

    #[test]
    fn embeds_manifest_verbatim() {
        let prompt = create_review_prompt(MANIFEST);
        assert!(prompt.contains(&format!("Here is the Swift package:\n\n{MANIFEST}\n\nNow, provide")));
    }

    #[test]
    fn asks_for_health_score() {
        let prompt = create_review_prompt("");
        assert!(prompt.contains("Conclude with a 'SwiftPM Health Score' out of 100."));
        assert!(prompt.contains("SwiftPM Health Score: 28/100"));
        assert!(prompt.contains(HEALTH_SCORE_LABEL));
    }

    #[test]
    fn numbers_every_instruction() {
        let prompt = create_review_prompt("");
        for n in 1..=INSTRUCTIONS.len() {
            assert!(prompt.contains(&format!("\n{n}. ")), "missing item {n}");
        }
        assert!(prompt.trim_end().ends_with("Now, provide your analysis."));
    }
}
