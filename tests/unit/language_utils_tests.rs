/*!
 * Tests for language code utilities
 */

use mqm_ape::language_utils::{get_language_name, normalize_to_part2t, resolve_language_label};

#[test]
fn test_normalizeToPart2t_withPart1Code_shouldReturnThreeLetters() {
    assert_eq!(normalize_to_part2t("de").unwrap(), "deu");
    assert_eq!(normalize_to_part2t(" EN ").unwrap(), "eng");
}

#[test]
fn test_normalizeToPart2t_withPart2bCode_shouldMapToPart2t() {
    assert_eq!(normalize_to_part2t("ger").unwrap(), "deu");
    assert_eq!(normalize_to_part2t("chi").unwrap(), "zho");
}

#[test]
fn test_normalizeToPart2t_withInvalidCode_shouldFail() {
    assert!(normalize_to_part2t("xx").is_err());
    assert!(normalize_to_part2t("english").is_err());
}

#[test]
fn test_getLanguageName_shouldReturnEnglishName() {
    assert_eq!(get_language_name("zh").unwrap(), "Chinese");
    assert_eq!(get_language_name("ces").unwrap(), "Czech");
}

#[test]
fn test_resolveLanguageLabel_shouldAcceptCodesAndNames() {
    assert_eq!(resolve_language_label("de"), "German");
    assert_eq!(resolve_language_label("german"), "German");
    assert_eq!(resolve_language_label("English"), "English");
    assert_eq!(resolve_language_label("Klingonish"), "Klingonish");
}
