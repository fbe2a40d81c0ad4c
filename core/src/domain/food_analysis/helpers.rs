use crate::domain::food_analysis::entities::{AnalysisResult, FoodItem};

/// Portions to seed an editor with: the result's own items when it has any,
/// otherwise whatever can be recovered from the portion summary.
pub fn editable_portions(result: &AnalysisResult) -> Vec<FoodItem> {
    match &result.food_items {
        Some(items) if !items.is_empty() => items.clone(),
        _ => parse_portion_size(&result.estimated_portion_size),
    }
}

/// Splits a summary like `"2 rotis + 150g dal, 200g rice"` into items.
///
/// A component whose first word is followed by more words becomes
/// `{quantity: first word, name: rest}`; a single word becomes the quantity
/// of a numbered placeholder item.
pub fn parse_portion_size(portion: &str) -> Vec<FoodItem> {
    portion
        .split(['+', ','])
        .enumerate()
        .filter_map(|(index, component)| {
            let component = component.trim();
            if component.is_empty() {
                return None;
            }

            match component.split_once(char::is_whitespace) {
                Some((quantity, name)) if !name.trim().is_empty() => {
                    Some(FoodItem::new(capitalize_words(name.trim()), quantity))
                }
                _ => Some(FoodItem::new(format!("Item {}", index + 1), component)),
            }
        })
        .collect()
}

fn capitalize_words(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[FoodItem]) -> Vec<(&str, &str)> {
        items
            .iter()
            .map(|item| (item.quantity.as_str(), item.name.as_str()))
            .collect()
    }

    #[test]
    fn test_parse_mixed_separators() {
        let items = parse_portion_size("2 rotis + 150g dal, 200g basmati RICE");
        assert_eq!(
            pairs(&items),
            vec![("2", "Rotis"), ("150g", "Dal"), ("200g", "Basmati Rice")]
        );
    }

    #[test]
    fn test_parse_single_token_becomes_placeholder() {
        let items = parse_portion_size("250g");
        assert_eq!(pairs(&items), vec![("250g", "Item 1")]);
    }

    #[test]
    fn test_parse_skips_empty_components() {
        let items = parse_portion_size("100g rice, , 1.5 cups");
        assert_eq!(pairs(&items), vec![("100g", "Rice"), ("1.5", "Cups")]);
        assert!(parse_portion_size("   ").is_empty());
    }
}
