//! Prompt composition for the natural-language query bridge, plus the
//! request shape and the post-processing applied to raw completions.

use serde::Deserialize;
use validator::{Validate, ValidationError};

/// Statement the completion service must answer with when a question cannot
/// be expressed over the registry tables.
pub const FALLBACK_SQL: &str = "SELECT 'unanswerable' AS resposta";

const SCHEMA_DESCRIPTION: &str = "\
PostgreSQL schema `patrimoni` (read-only):

patrimoni.actius(guid text PK, tipus text, subtipus text, ubicacio text, created_at timestamptz, updated_at timestamptz)
  -- physical assets. tipus is the IFC category (IFCDOOR, IFCFURNISHINGELEMENT, ...).
  -- subtipus refines it (Dutxa, Extintor, PortaTallafoc, Lavabo, Ascensor, ...).
  -- ubicacio has the fixed format BBB-FFF-SSS: building code, floor, room.
  --   The building code is LEFT(ubicacio, 3).
patrimoni.ifcdoor(actiu_id text PK -> actius.guid, from_room text, to_room text)
  -- one row per door asset.
patrimoni.ifcdoor_fire(actiu_id text PK -> ifcdoor.actiu_id, numero text)
  -- one row per fire door (PortaTallafoc), numero is its label.
patrimoni.ifcspace(guid text PK, codi text, edifici text, planta text, dispositiu text,
                   departament text, id_intern text, centre_cost text, area double precision)
  -- rooms. edifici is the building code, area is in square metres.";

const WORKED_EXAMPLES: &str = "\
Question: Quantes Dutxa hi ha a l'edifici CQA?
SQL: SELECT COUNT(*) AS total FROM patrimoni.actius WHERE subtipus = 'Dutxa' AND LEFT(ubicacio, 3) = 'CQA'

Question: Llista les PortaTallafoc de la planta P01 de CQA amb el seu numero
SQL: SELECT a.guid, a.ubicacio, f.numero FROM patrimoni.actius a JOIN patrimoni.ifcdoor_fire f ON f.actiu_id = a.guid WHERE a.ubicacio LIKE 'CQA-P01-%'

Question: Quina es l'area total dels espai per departament a l'edifici CQB?
SQL: SELECT departament, SUM(area) AS area_total FROM patrimoni.ifcspace WHERE edifici = 'CQB' GROUP BY departament ORDER BY departament";

/// Body of a natural-language query request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuestionRequest {
    #[validate(
        length(min = 1, max = 2000, message = "question must be between 1 and 2000 characters"),
        custom(function = "validate_not_blank")
    )]
    pub question: String,

    /// Optional building code the answer should be restricted to.
    #[serde(default, alias = "edifici")]
    #[validate(custom(function = "validate_building_scope"))]
    pub building: Option<String>,
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("question must not be blank".into());
        return Err(err);
    }
    Ok(())
}

fn validate_building_scope(value: &str) -> Result<(), ValidationError> {
    let valid = !value.is_empty()
        && value.len() <= 16
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        let mut err = ValidationError::new("building_scope");
        err.message = Some("building must be 1-16 characters of [A-Za-z0-9_-]".into());
        return Err(err);
    }
    Ok(())
}

/// Compose the single prompt sent to the completion service.
pub fn compose_prompt(normalized_question: &str, building: Option<&str>) -> String {
    let mut prompt = String::new();

    prompt.push_str("You translate questions about a building asset registry into PostgreSQL.\n\n");
    prompt.push_str("## Schema\n");
    prompt.push_str(SCHEMA_DESCRIPTION);
    prompt.push_str("\n\n## Examples\n");
    prompt.push_str(WORKED_EXAMPLES);
    prompt.push_str("\n\n## Rules\n");
    prompt.push_str("- Respond with exactly one SQL SELECT statement and nothing else.\n");
    prompt.push_str("- No prose, no explanations, no markdown, no code fences.\n");
    prompt.push_str("- Always qualify tables with the patrimoni schema.\n");
    prompt.push_str("- Never modify data.\n");
    prompt.push_str(&format!(
        "- If the question cannot be answered from this schema, respond with: {FALLBACK_SQL}\n"
    ));

    if let Some(building) = building {
        prompt.push_str(&format!(
            "- Only consider rows of building '{building}' (LEFT(ubicacio, 3) for actius, edifici for ifcspace).\n"
        ));
    }

    prompt.push_str("\n## Question\n");
    prompt.push_str(normalized_question.trim());
    prompt.push_str("\nSQL:");

    prompt
}

/// Strip the wrapping a completion model tends to add around SQL.
///
/// Takes the body of the first markdown code fence when present, drops a
/// leading `SQL:` label, and trims whitespace. The statement itself is never
/// rewritten.
pub fn extract_sql(completion: &str) -> String {
    let mut text = completion.trim();

    if let Some(start) = text.find("```") {
        let after_fence = &text[start + 3..];
        let body_start = match after_fence.find('\n') {
            Some(newline) if is_fence_language(&after_fence[..newline]) => newline + 1,
            _ => 0,
        };
        let body = &after_fence[body_start..];
        text = match body.find("```") {
            Some(end) => &body[..end],
            None => body,
        };
        text = text.trim();
    }

    if text.get(..4).is_some_and(|label| label.eq_ignore_ascii_case("sql:")) {
        text = text[4..].trim_start();
    }

    text.trim().to_string()
}

fn is_fence_language(tag: &str) -> bool {
    let tag = tag.trim();
    tag.is_empty()
        || tag.eq_ignore_ascii_case("sql")
        || tag.eq_ignore_ascii_case("postgresql")
        || tag.eq_ignore_ascii_case("postgres")
        || tag.eq_ignore_ascii_case("pgsql")
}
