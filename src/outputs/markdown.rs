//! Markdown rendering for a single article.
//!
//! Output is a pure function of the [`Article`]: no timestamps, no
//! randomness. Section order is fixed:
//!
//! ```text
//! # Title
//! ## 1. Introduction
//! ## 2. When is it used?
//! ## 3. ASCII Diagram        (fenced, preformatted)
//! ## 4. Approaches
//! ### <approach>             (one per named approach, in order)
//! #### Code Implementations  (collapsible C++, Java, Python blocks)
//! ## 5. Time & Space Complexity
//! ```
//!
//! Text fields are only right-trimmed; leading and interior whitespace is kept
//! because code and diagrams depend on it.

use crate::models::{Approach, Article, Language};
use std::fmt::Write;

/// Render an article to a Markdown document.
pub fn render_article(article: &Article) -> String {
    let mut md = String::new();

    writeln!(md, "# {}\n", article.title.trim_end()).unwrap();

    writeln!(md, "## 1. Introduction").unwrap();
    writeln!(md, "{}\n", article.intro.trim_end()).unwrap();

    writeln!(md, "## 2. When is it used?").unwrap();
    writeln!(md, "{}\n", article.use_cases.trim_end()).unwrap();

    writeln!(md, "## 3. ASCII Diagram\n").unwrap();
    writeln!(md, "```\n{}\n```\n", article.ascii_diagram.trim_end()).unwrap();

    writeln!(md, "## 4. Approaches\n").unwrap();
    for approach in article.approaches.iter().filter(|a| !a.is_unnamed()) {
        render_approach(&mut md, approach);
    }

    writeln!(md, "## 5. Time & Space Complexity\n").unwrap();
    writeln!(md, "{}", article.complexity.trim_end()).unwrap();

    md
}

fn render_approach(md: &mut String, approach: &Approach) {
    writeln!(md, "### {}\n", approach.name.trim()).unwrap();
    writeln!(md, "{}\n", approach.explanation.trim_end()).unwrap();
    writeln!(md, "#### Code Implementations\n").unwrap();

    for lang in Language::ALL {
        writeln!(md, "<details>").unwrap();
        writeln!(md, "<summary><strong>{}</strong></summary>\n", lang.label()).unwrap();
        writeln!(md, "```{}", lang.key()).unwrap();
        writeln!(md, "{}", approach.code(lang).trim_end()).unwrap();
        writeln!(md, "```\n").unwrap();
        writeln!(md, "</details>\n").unwrap();
    }

    writeln!(md, "---\n").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn approach(name: &str) -> Approach {
        let code_by_language = BTreeMap::from([
            (Language::Cpp, format!("// {name} in C++\nint f() {{\n    return 0;\n}}   \n\n")),
            (Language::Java, format!("// {name} in Java")),
            (Language::Python, format!("def f():\n    # {name}\n    return 0\n")),
        ]);
        Approach {
            name: name.to_string(),
            explanation: format!("How {name} works.  \n"),
            code_by_language,
        }
    }

    fn article(approaches: Vec<Approach>) -> Article {
        Article {
            title: "Binary Search".into(),
            intro: "Searches a sorted array.\n\n".into(),
            use_cases: "Lookups.".into(),
            ascii_diagram: "  [1][3][5]\n   ^  ^  ^   \n".into(),
            approaches,
            complexity: "O(log n) time, O(1) space.\n".into(),
        }
    }

    #[test]
    fn test_render_full_document() {
        let md = render_article(&article(vec![approach("Iterative")]));

        let expected = "# Binary Search\n\n\
## 1. Introduction\nSearches a sorted array.\n\n\
## 2. When is it used?\nLookups.\n\n\
## 3. ASCII Diagram\n\n```\n  [1][3][5]\n   ^  ^  ^\n```\n\n\
## 4. Approaches\n\n\
### Iterative\n\nHow Iterative works.\n\n#### Code Implementations\n\n\
<details>\n<summary><strong>C++</strong></summary>\n\n```cpp\n// Iterative in C++\nint f() {\n    return 0;\n}\n```\n\n</details>\n\n\
<details>\n<summary><strong>Java</strong></summary>\n\n```java\n// Iterative in Java\n```\n\n</details>\n\n\
<details>\n<summary><strong>Python</strong></summary>\n\n```python\ndef f():\n    # Iterative\n    return 0\n```\n\n</details>\n\n\
---\n\n\
## 5. Time & Space Complexity\n\nO(log n) time, O(1) space.\n";

        assert_eq!(md, expected);
    }

    #[test]
    fn test_render_is_deterministic() {
        let a = article(vec![approach("A"), approach("B")]);
        assert_eq!(render_article(&a), render_article(&a));
    }

    #[test]
    fn test_render_without_approaches() {
        let md = render_article(&article(vec![]));
        assert!(md.contains("## 4. Approaches\n\n## 5. Time & Space Complexity"));
        assert!(!md.contains("<details>"));
    }

    #[test]
    fn test_render_skips_unnamed_and_keeps_order() {
        let mut unnamed = approach("Hidden");
        unnamed.name = "  ".into();
        let md = render_article(&article(vec![
            approach("Recursive"),
            unnamed,
            approach("Iterative"),
        ]));

        assert_eq!(md.matches("\n### ").count(), 2);
        assert!(!md.contains("How Hidden works"));
        let recursive = md.find("### Recursive").unwrap();
        let iterative = md.find("### Iterative").unwrap();
        assert!(recursive < iterative);
    }

    #[test]
    fn test_render_missing_code_is_empty_block() {
        let a = article(vec![Approach {
            name: "Sketch".into(),
            explanation: String::new(),
            code_by_language: BTreeMap::new(),
        }]);
        let md = render_article(&a);
        assert!(md.contains("```java\n\n```"));
        let cpp = md.find("```cpp").unwrap();
        let java = md.find("```java").unwrap();
        let python = md.find("```python").unwrap();
        assert!(cpp < java && java < python);
    }
}
