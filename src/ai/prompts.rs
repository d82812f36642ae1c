// src/ai/prompts.rs

use crate::models::{level::DifficultyLevel, question::DraftQuestion};

pub const CLEAN_SYSTEM: &str = r#"You are a text extraction and formatting expert. Your task:
1. Find and return only the main article text without changing or rearranging phrases
2. Remove all technical information, ads, menus, and other elements
3. Format the text as follows:
   - Article title should be in format: # Title
   - Subtitles in format: ## Subtitle
   - Separate paragraphs with empty line
   - Preserve lists and important formatting elements
   - Use **bold text** for important phrases

Return the text in Markdown format."#;

pub fn clean_user(raw_text: &str) -> String {
    format!(
        "Find, clean and format the main article text from the following content:\n\n{}",
        raw_text
    )
}

pub fn adapt_system(level: DifficultyLevel) -> String {
    format!(
        r#"You are a language adaptation expert. Your task:
1. Adapt the text to {level} level while preserving the meaning
2. Simplify vocabulary and grammar according to {level} requirements
3. Keep the text natural and engaging
4. Preserve Markdown formatting
5. Do not change or remove important information

Return the adapted text in Markdown format."#
    )
}

pub fn adapt_user(text: &str, level: DifficultyLevel) -> String {
    format!("Adapt this text to {} level:\n\n{}", level, text)
}

fn level_instruction(level: DifficultyLevel) -> String {
    if level.needs_adaptation() {
        format!(" at {} level", level)
    } else {
        String::new()
    }
}

const QUESTION_RULES: &str = r#"   - Test understanding of important information from the text
   - Have 4 answer options
   - Have only one correct answer
   - Be clear and unambiguous"#;

const QUESTION_SHAPE: &str = r#"{
    "question": "What is the main topic of the text?",
    "options": [
      "First option",
      "Second option",
      "Third option",
      "Fourth option"
    ],
    "correct_answer": "First option"
  }"#;

pub fn generate_system(count: u32, level: DifficultyLevel) -> String {
    format!(
        r#"You are a quiz generation expert. Your task:
1. Create {count} multiple-choice questions based on the text{level}
2. Each question should:
{rules}
3. Return questions in VALID JSON format like this:
[
  {shape}
]
IMPORTANT: Make sure to use double quotes for strings and escape special characters properly!"#,
        level = level_instruction(level),
        rules = QUESTION_RULES,
        shape = QUESTION_SHAPE,
    )
}

pub fn generate_user(text: &str, count: u32) -> String {
    format!("Generate {} questions based on this text:\n\n{}", count, text)
}

pub fn regenerate_system(
    existing: &[DraftQuestion],
    skip_index: usize,
    level: DifficultyLevel,
) -> String {
    let others = existing
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != skip_index)
        .map(|(i, q)| format!("{}. {}", i + 1, q.question))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a quiz generation expert. Your task:
1. Create 1 multiple-choice question based on the text{level}
2. The question should:
{rules}
   - Be DIFFERENT from these existing questions:
{others}
3. Return the question in VALID JSON format like this:
{shape}
IMPORTANT: Make sure to use double quotes for strings and escape special characters properly!"#,
        level = level_instruction(level),
        rules = QUESTION_RULES,
        others = others,
        shape = QUESTION_SHAPE,
    )
}

pub fn regenerate_user(text: &str) -> String {
    format!("Generate a new question based on this text:\n\n{}", text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_only_mentioned_when_adapting() {
        assert!(generate_system(5, DifficultyLevel::B1).contains("based on the text at B1 level"));
        assert!(generate_system(5, DifficultyLevel::Original).contains("based on the text\n"));
    }

    #[test]
    fn regenerate_lists_other_questions_only() {
        let q = |t: &str| DraftQuestion {
            question: t.to_string(),
            options: vec![],
            correct_answer: String::new(),
        };
        let prompt = regenerate_system(&[q("First?"), q("Second?"), q("Third?")], 1, DifficultyLevel::Original);
        assert!(prompt.contains("1. First?"));
        assert!(prompt.contains("3. Third?"));
        assert!(!prompt.contains("Second?"));
    }
}
