//! Width and separator normalization.

/// Offset between the full-width ASCII block (U+FF01..U+FF5E) and ASCII.
const FULLWIDTH_OFFSET: u32 = 0xFEE0;

/// Normalize a single line before pattern matching.
///
/// - Full-width ASCII variants (U+FF01..U+FF5E) fold to ASCII
/// - The ideographic space (U+3000) folds to a plain space
/// - Hyphen and dash variants fold to `-`
///
/// # Examples
///
/// ```
/// use figure_oxide::text::normalize_line;
///
/// assert_eq!(normalize_line("如图２－１所示"), "如图2-1所示");
/// assert_eq!(normalize_line("Figure 3–2"), "Figure 3-2");
/// ```
pub fn normalize_line(line: &str) -> String {
    line.chars().map(normalize_char).collect()
}

fn normalize_char(ch: char) -> char {
    let code = ch as u32;
    match code {
        0xFF01..=0xFF5E => char::from_u32(code - FULLWIDTH_OFFSET).unwrap_or(ch),
        0x3000 => ' ',
        // ‐ ‑ ‒ – — ― − ﹣
        0x2010..=0x2015 | 0x2212 | 0xFE63 => '-',
        _ => ch,
    }
}

/// True when the line has no letter, digit or ideograph left after normalization.
///
/// Such lines never produce reference candidates.
pub fn is_punctuation_only(line: &str) -> bool {
    !line.chars().any(char::is_alphanumeric)
}

/// True for lines a marker may be placed next to without splitting a paragraph:
/// blank lines and Markdown headings.
pub fn is_paragraph_break(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// True when the trimmed line closes a sentence or introduces a list (`。` `.` `：` `:`).
pub fn ends_sentence(line: &str) -> bool {
    line.trim_end().ends_with(&['。', '.', '：', ':'][..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fullwidth_digits_fold() {
        assert_eq!(normalize_line("０１２３４５６７８９"), "0123456789");
    }

    #[test]
    fn test_fullwidth_letters_and_punctuation_fold() {
        assert_eq!(normalize_line("Ｆｉｇ．１＿２"), "Fig.1_2");
    }

    #[test]
    fn test_ideographic_space_folds() {
        assert_eq!(normalize_line("图\u{3000}3"), "图 3");
    }

    #[test]
    fn test_dash_variants_fold() {
        for dash in ['\u{2010}', '\u{2013}', '\u{2014}', '\u{2212}', '\u{FE63}', '\u{FF0D}'] {
            let line = format!("2{}1", dash);
            assert_eq!(normalize_line(&line), "2-1", "dash U+{:04X}", dash as u32);
        }
    }

    #[test]
    fn test_cjk_text_unchanged() {
        assert_eq!(normalize_line("诊疗流程图"), "诊疗流程图");
    }

    #[test]
    fn test_punctuation_only() {
        assert!(is_punctuation_only(""));
        assert!(is_punctuation_only("  -- ... ---"));
        assert!(is_punctuation_only("。，、"));
        assert!(!is_punctuation_only("图"));
        assert!(!is_punctuation_only("- 1 -"));
    }

    #[test]
    fn test_paragraph_break() {
        assert!(is_paragraph_break(""));
        assert!(is_paragraph_break("   "));
        assert!(is_paragraph_break("## Results"));
        assert!(!is_paragraph_break("Body text."));
    }

    #[test]
    fn test_ends_sentence() {
        assert!(ends_sentence("治疗结束。"));
        assert!(ends_sentence("See below:  "));
        assert!(ends_sentence("步骤如下："));
        assert!(!ends_sentence("如图 2-1 所示"));
        assert!(!ends_sentence(""));
    }
}
