//! Localized message templates keyed by error code.
//!
//! Unknown languages fall back to English; unknown codes render no message.
//! `{field}` in a template is replaced by the offending member name.

use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const DEFAULT_LANGUAGE: &str = "en";

type Templates = HashMap<&'static str, &'static str>;

static MESSAGES: Lazy<HashMap<&'static str, Templates>> = Lazy::new(|| {
    HashMap::from([
        (
            "en",
            HashMap::from([
                ("required", "{field} is a required field"),
                ("min", "{field} is below the allowed minimum"),
                ("max", "{field} exceeds the allowed maximum"),
                ("len", "{field} does not have the required length"),
                ("unique", "{field} must be unique"),
                ("duplicate", "{field} is already taken"),
                ("not_found", "Missing resource. Are you sure this is it?"),
                (
                    "version_conflict",
                    "This record was changed by someone else. Reload it and try again",
                ),
                ("invalid", "There was something wrong with the request"),
                ("server_internal", "Oops! Something went wrong"),
            ]),
        ),
        (
            "es",
            HashMap::from([
                ("required", "{field} es un campo obligatorio"),
                ("min", "{field} es menor que el mínimo permitido"),
                ("max", "{field} supera el máximo permitido"),
                ("len", "{field} no tiene la longitud requerida"),
                ("unique", "{field} debe ser único"),
                ("duplicate", "{field} ya está en uso"),
                ("not_found", "Recurso no encontrado. ¿Seguro que es este?"),
                (
                    "version_conflict",
                    "Otra persona modificó este registro. Vuelve a cargarlo e inténtalo de nuevo",
                ),
                ("invalid", "La solicitud no es válida"),
                ("server_internal", "¡Ups! Algo salió mal"),
            ]),
        ),
    ])
});

/// Renders the template for `code` in `language`.
pub fn template(language: &str, code: &str, field: Option<&str>) -> Option<String> {
    let templates = MESSAGES
        .get(normalize_language(language).as_str())
        .or_else(|| MESSAGES.get(DEFAULT_LANGUAGE))?;
    let template = templates.get(code)?;
    Some(template.replace("{field}", field.unwrap_or("value")))
}

/// Reduces tags such as `es-MX` or ` EN ` to the primary subtag.
pub(crate) fn normalize_language(language: &str) -> String {
    language
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}
