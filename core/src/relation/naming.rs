use heck::{ToLowerCamelCase, ToSnakeCase};

/// `authorId` -> `author`, `owner_id` -> `owner`
pub(crate) fn forward_name(column: &str) -> String {
    for suffix in ["_id", "Id", "ID"] {
        if let Some(stem) = column.strip_suffix(suffix)
            && !stem.is_empty()
        {
            return stem.to_lower_camel_case();
        }
    }
    column.to_lower_camel_case()
}

/// `user_preferences` -> `userPreferences`
pub(crate) fn singular_name(table: &str) -> String {
    table.to_lower_camel_case()
}

/// `postCategory` -> `postCategories`; only the last word is pluralized
pub(crate) fn plural_name(table: &str) -> String {
    let snake = table.to_snake_case();
    let plural = match snake.rsplit_once('_') {
        Some((head, last)) => format!("{head}_{}", pluralizer::pluralize(last, 2, false)),
        None => pluralizer::pluralize(&snake, 2, false),
    };
    plural.to_lower_camel_case()
}
