//! Catalogue field translation.
//!
//! Three fixed schemas are bridged here: the legacy Spanish "Uniliber"
//! spreadsheet headers, the internal DB field names, and the Spanish "ES"
//! export headers. The dictionaries are data, not logic; the only logic is
//! value reshaping for the array-valued fields.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};

/// Uniliber spreadsheet header -> DB field name.
pub static UNILIBER_TO_DB: Lazy<IndexMap<&'static str, &'static str>> = Lazy::new(|| {
    IndexMap::from([
        ("Referencia", "ref"),
        ("ISBN", "isbn"),
        ("Título", "title"),
        ("Autor", "author"),
        ("Lugar de publicación", "publication_place"),
        ("Editorial", "publisher"),
        ("Colección", "collection"),
        ("Año", "year"),
        ("Tamaño", "size"),
        ("Peso", "weight"),
        ("Páginas", "pages"),
        ("Estado", "condition"),
        ("Descripción", "description"),
        ("Encuadernación", "binding"),
        ("Precio", "price"),
        ("Cantidad", "stock"),
        ("Nota privada", "private_note"),
        ("Idiomas", "languages"),
        ("Materias", "topics"),
        ("Palabras clave", "keywords"),
        ("Imagen", "images"),
    ])
});

/// Legacy Uniliber columns with no DB counterpart; dropped on import.
pub static UNILIBER_IGNORED: &[&str] = &[
    "Ilustración",
    "Edición",
    "Tirada",
    "Dedicatoria",
    "Estado de la cubierta",
    "Tipo de artículo",
    "Catálogo",
    "Categoría AbeBooks",
];

/// DB field name -> ES export header. A strict subset of the DB fields:
/// id, store_id, private_note, status, location and the timestamps are never
/// exported.
pub static DB_TO_ES: Lazy<IndexMap<&'static str, &'static str>> = Lazy::new(|| {
    IndexMap::from([
        ("ref", "Referencia"),
        ("isbn", "ISBN"),
        ("title", "Título"),
        ("author", "Autor"),
        ("publication_place", "Lugar de publicación"),
        ("publisher", "Editorial"),
        ("collection", "Colección"),
        ("year", "Año"),
        ("size", "Tamaño"),
        ("weight", "Peso"),
        ("pages", "Páginas"),
        ("condition", "Estado"),
        ("description", "Descripción"),
        ("binding", "Encuadernación"),
        ("price", "Precio"),
        ("stock", "Cantidad"),
        ("languages", "Idiomas"),
        ("topics", "Materias"),
        ("keywords", "Palabras clave"),
        ("images", "Imagen"),
    ])
});

/// Flags steering the inbound value reshaping. Both are opt-in.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranslateOptions {
    /// When a row has keywords but no topics, reuse the keywords as topics.
    pub derive_topics_from_keywords: bool,
    /// Strip literal `<p>` / `</p>` markers from descriptions.
    pub clean_html: bool,
}

/// Map one Uniliber row to a DB-shaped row.
///
/// Every DB field in the dictionary appears in the output; a field absent
/// from the source row maps to null, never to an empty string or omission.
/// Unmapped legacy columns are dropped.
pub fn uniliber_to_db(row: &Map<String, Value>, options: TranslateOptions) -> Map<String, Value> {
    let mut out = Map::new();
    for (uniliber, db) in UNILIBER_TO_DB.iter() {
        let value = row.get(*uniliber).cloned().unwrap_or(Value::Null);
        let value = match *db {
            "images" => wrap_image(value),
            "keywords" | "topics" | "languages" => split_list(value),
            "description" if options.clean_html => clean_description(value),
            _ => value,
        };
        out.insert((*db).to_string(), value);
    }

    if options.derive_topics_from_keywords
        && out.get("topics").map(Value::is_null).unwrap_or(true)
    {
        if let Some(keywords @ Value::Array(_)) = out.get("keywords") {
            let keywords = keywords.clone();
            out.insert("topics".to_string(), keywords);
        }
    }
    out
}

/// Map one DB-shaped row to an ES export row: project each field present in
/// the ES dictionary; list-valued fields are comma-joined, by symmetry with
/// the inbound comma-split rule.
pub fn db_to_es(row: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (db, es) in DB_TO_ES.iter() {
        let value = row.get(*db).cloned().unwrap_or(Value::Null);
        let value = match value {
            Value::Array(items) => {
                let joined = items
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                Value::String(joined)
            }
            other => other,
        };
        out.insert((*es).to_string(), value);
    }
    out
}

/// A single legacy URL string becomes a one-element list.
fn wrap_image(value: Value) -> Value {
    match value {
        Value::String(s) if !s.trim().is_empty() => {
            Value::Array(vec![Value::String(s.trim().to_string())])
        }
        _ => Value::Null,
    }
}

/// Comma-separated cell -> trimmed list; empty entries are dropped.
fn split_list(value: Value) -> Value {
    match value {
        Value::String(s) => {
            let items: Vec<Value> = s
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| Value::String(part.to_string()))
                .collect();
            if items.is_empty() {
                Value::Null
            } else {
                Value::Array(items)
            }
        }
        Value::Array(_) => value,
        _ => Value::Null,
    }
}

/// Naive `<p>` marker stripping — deliberately not a general HTML sanitizer.
fn clean_description(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.replace("<p>", "").replace("</p>", "")),
        other => other,
    }
}
