//! Instruction text sent to the model.

use crate::models::FieldEncoding;

const BASE64_SCHEMA: &str = r#"{
  "title_b64": "<base64(title)>",
  "intro_b64": "<base64(intro)>",
  "use_cases_b64": "<base64(use_cases)>",
  "ascii_diagram_b64": "<base64(ascii_diagram)>",
  "approaches": [
    {
      "name_b64": "<base64(approach_name)>",
      "explanation_b64": "<base64(approach_explanation)>",
      "cpp_b64": "<base64(cpp_code)>",
      "java_b64": "<base64(java_code)>",
      "python_b64": "<base64(python_code)>"
    }
  ],
  "complexity_b64": "<base64(complexity_discussion)>"
}"#;

const PLAIN_SCHEMA: &str = r#"{
  "title": "<title>",
  "intro": "<intro>",
  "use_cases": "<use_cases>",
  "ascii_diagram": "<ascii_diagram>",
  "approaches": [
    {
      "name": "<approach_name>",
      "explanation": "<approach_explanation>",
      "code": {
        "cpp": "<cpp_code>",
        "java": "<java_code>",
        "python": "<python_code>"
      }
    }
  ],
  "complexity": "<complexity_discussion>"
}"#;

/// Build the generation prompt.
///
/// The prompt pins the exact article count, the field layout for `encoding`,
/// and lists every slug in `used_slugs` so the model picks new topics.
pub fn build_prompt(used_slugs: &[String], count: usize, encoding: FieldEncoding) -> String {
    let used = if used_slugs.is_empty() {
        "(none yet)".to_string()
    } else {
        used_slugs.join(", ")
    };

    let (suffix, schema, encoding_rule) = match encoding {
        FieldEncoding::Base64 => (
            "_b64",
            BASE64_SCHEMA,
            "\nIMPORTANT ENCODING RULE:\n\
             - ALL text fields in the JSON MUST be base64-encoded UTF-8 strings.\n\
             - This includes titles, explanations, diagrams, code, and complexity sections.\n\
             - Use standard base64 with no newlines.\n",
        ),
        FieldEncoding::Plain => (
            "",
            PLAIN_SCHEMA,
            "\nIMPORTANT ENCODING RULE:\n\
             - All text fields are ordinary JSON strings.\n\
             - Escape every backslash, double quote and newline inside strings, \
             especially inside code.\n",
        ),
    };
    let code_fields = match encoding {
        FieldEncoding::Base64 => "cpp_b64 / java_b64 / python_b64",
        FieldEncoding::Plain => "code.cpp / code.java / code.python",
    };

    format!(
        "You are generating {count} medium-length, strictly professional articles on
classic Data Structures and Algorithms for a GitHub knowledge base.

Requirements:
- Domain: ONLY core DSA and algorithms (arrays, linked lists, stacks, queues, trees, heaps,
  hash tables, tries, graphs, greedy, dynamic programming, recursion, divide & conquer,
  segment trees, Fenwick tree, string algorithms like KMP, Z, suffix array, number theory, etc.).
- Exclude: system design, ML, OS, DBMS, web dev, networking, etc.
- Audience: competitive programmers and software engineers preparing for interviews.
- Tone: professional, precise, no emojis, no em/long dashes, no casual language.
- Depth: medium-level detail.

Topic rules:
- Generate exactly {count} DISTINCT topics.
- Include ALL logically relevant approaches.
- Each topic must be NEW and must NOT correspond to any of these previously used slugs:
  {used}
- Topics must be focused (e.g., Binary Search, KMP, Dijkstra).
- Every approach must have:
  - A clear explanation.
  - C++, Java, and Python code.
{encoding_rule}
For each topic, return the following JSON structure:

{schema}

Details for each field:
- title{suffix}: short, precise name of the algorithm or data structure.
- intro{suffix}: 1-2 paragraphs explaining what the topic is.
- use_cases{suffix}: real-world or interview-style scenarios where this is used.
- ascii_diagram{suffix}: an ASCII representation of the structure or process when applicable;
  if not applicable, use a minimal schematic or short note.
- approaches: an array of one or more approaches. Each MUST have:
  - name{suffix}: for example \"Brute Force\", \"Two-Pointer Optimized\", \"Dynamic Programming (Bottom-Up)\".
  - explanation{suffix}: 1-3 paragraphs explaining how that approach works and its idea.
  - {code_fields}: clean, compilable code for that approach.
- complexity{suffix}: summary of time and space complexity for the main approaches.

OUTPUT FORMAT:
- Respond with a single bare JSON array of exactly {count} such objects.
- The JSON must be valid and directly parseable by a strict JSON parser.
- Do NOT include any markdown, code fences, comments, or extra text."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_states_count_and_shape() {
        let prompt = build_prompt(&[], 10, FieldEncoding::Base64);
        assert!(prompt.contains("Generate exactly 10 DISTINCT topics"));
        assert!(prompt.contains("single bare JSON array of exactly 10 such objects"));
        assert!(prompt.contains("Do NOT include any markdown, code fences"));
        assert!(prompt.contains("(none yet)"));
    }

    #[test]
    fn test_prompt_lists_used_slugs() {
        let used = vec!["binary_search".to_string(), "kmp_algorithm".to_string()];
        let prompt = build_prompt(&used, 3, FieldEncoding::Base64);
        assert!(prompt.contains("binary_search, kmp_algorithm"));
        assert!(prompt.contains("exactly 3 such objects"));
    }

    #[test]
    fn test_base64_prompt_names_every_field() {
        let prompt = build_prompt(&[], 10, FieldEncoding::Base64);
        assert!(prompt.contains("base64-encoded UTF-8"));
        for field in [
            "title_b64",
            "intro_b64",
            "use_cases_b64",
            "ascii_diagram_b64",
            "approaches",
            "name_b64",
            "explanation_b64",
            "cpp_b64",
            "java_b64",
            "python_b64",
            "complexity_b64",
        ] {
            assert!(prompt.contains(field), "missing field {field}");
        }
    }

    #[test]
    fn test_plain_prompt_has_no_base64_convention() {
        let prompt = build_prompt(&[], 5, FieldEncoding::Plain);
        assert!(!prompt.contains("_b64"));
        assert!(!prompt.contains("base64"));
        assert!(prompt.contains("\"code\""));
        assert!(prompt.contains("intro: 1-2 paragraphs"));
    }

    #[test]
    fn test_prompt_is_pure() {
        let used = vec!["heap".to_string()];
        assert_eq!(
            build_prompt(&used, 10, FieldEncoding::Base64),
            build_prompt(&used, 10, FieldEncoding::Base64)
        );
    }
}
