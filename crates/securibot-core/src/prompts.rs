//! Suggested prompts offered on an empty conversation.

const SUGGESTED_PROMPTS: [&str; 4] = [
    "Quels sont les risques de phishing courants ?",
    "Comment puis-je sécuriser mon réseau Wi-Fi domestique ?",
    "Expliquez l'authentification à deux facteurs.",
    "Qu'est-ce qu'un ransomware et comment s'en protéger ?",
];

/// Returns the static list of starter prompts.
pub fn suggested_prompts() -> &'static [&'static str] {
    &SUGGESTED_PROMPTS
}
