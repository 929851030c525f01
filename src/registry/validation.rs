//! Per-type admission rules for keyword drafts.
//!
//! Runs before anything is written to the registry, so a rejected draft can
//! never leave a half-inserted definition behind.

use crate::model::KeywordType;

use super::definition::{EventSpec, FunctionSpec, KeywordDraft, Payload};
use super::error::RegistrationError;

/// Validate the type-specific part of a draft and build its payload.
/// Presence of a type and keywords, and keyword uniqueness, are checked by
/// the registry before this runs.
pub(super) fn validate(ty: KeywordType, draft: KeywordDraft) -> Result<Payload, RegistrationError> {
    let keyword = draft.keywords.first().cloned().unwrap_or_default();
    match ty {
        KeywordType::Function => validate_function(&keyword, draft).map(Payload::Function),
        KeywordType::Event => validate_event(&keyword, &draft).map(Payload::Event),
        KeywordType::Loop | KeywordType::Conditional => {
            Err(RegistrationError::UnsupportedType(ty.label().to_string()))
        }
        _ => validate_literal(&keyword, &draft).map(|()| Payload::Literal),
    }
}

/// Every keyword must be a single non-blank word so a tokenizer can produce it.
pub(super) fn validate_keywords(draft: &KeywordDraft) -> Result<(), RegistrationError> {
    let keyword = draft.keywords.first().map_or("", String::as_str);
    for word in &draft.keywords {
        if word.trim().is_empty() {
            return Err(RegistrationError::invalid(keyword, "blank keyword"));
        }
        if word.chars().any(char::is_whitespace) {
            return Err(RegistrationError::invalid(
                keyword,
                format!("keyword \"{word}\" contains whitespace"),
            ));
        }
    }
    Ok(())
}

fn validate_function(keyword: &str, draft: KeywordDraft) -> Result<FunctionSpec, RegistrationError> {
    if draft.bind_to.is_some() || draft.requires_bound_element {
        return Err(RegistrationError::invalid(
            keyword,
            "bind targets are only valid on EVENT keywords",
        ));
    }
    let handler = draft
        .handler
        .ok_or_else(|| RegistrationError::invalid(keyword, "missing handler"))?;
    let required = draft.required.unwrap_or_default();
    let optional = draft.optional;

    for ty in required.iter().chain(optional.iter()) {
        if !ty.is_value() {
            return Err(RegistrationError::invalid(
                keyword,
                format!("{ty} cannot be a parameter type"),
            ));
        }
    }
    if let Some(ty) = draft.produces {
        if !ty.is_value() {
            return Err(RegistrationError::invalid(
                keyword,
                format!("{ty} cannot be produced as a value"),
            ));
        }
    }

    let slots = required.len() + optional.len();
    if handler.arity() != slots {
        return Err(RegistrationError::invalid(
            keyword,
            format!(
                "handler takes {} argument(s) but {slots} parameter slot(s) are declared",
                handler.arity()
            ),
        ));
    }

    Ok(FunctionSpec {
        required,
        optional,
        produces: draft.produces,
        handler,
    })
}

fn validate_event(keyword: &str, draft: &KeywordDraft) -> Result<EventSpec, RegistrationError> {
    reject_function_fields(keyword, draft)?;
    match (&draft.bind_to, draft.requires_bound_element) {
        (Some(target), false) => Ok(EventSpec::Target(target.clone())),
        (None, true) => Ok(EventSpec::BoundElement),
        (Some(_), true) => Err(RegistrationError::invalid(
            keyword,
            "bind target conflicts with requires_bound_element",
        )),
        (None, false) => Err(RegistrationError::invalid(keyword, "no bind target")),
    }
}

fn validate_literal(keyword: &str, draft: &KeywordDraft) -> Result<(), RegistrationError> {
    reject_function_fields(keyword, draft)?;
    if draft.bind_to.is_some() || draft.requires_bound_element {
        return Err(RegistrationError::invalid(
            keyword,
            "bind targets are only valid on EVENT keywords",
        ));
    }
    Ok(())
}

fn reject_function_fields(keyword: &str, draft: &KeywordDraft) -> Result<(), RegistrationError> {
    let field = if draft.handler.is_some() {
        Some("handler")
    } else if draft.required.is_some() {
        Some("required")
    } else if !draft.optional.is_empty() {
        Some("optional")
    } else if draft.produces.is_some() {
        Some("produces")
    } else {
        None
    };
    match field {
        Some(field) => Err(RegistrationError::invalid(
            keyword,
            format!("`{field}` is only valid on FUNCTION keywords"),
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::registry::definition::{BindTarget, Handler};

    fn reason(err: RegistrationError) -> String {
        match err {
            RegistrationError::InvalidDefinition { reason, .. } => reason,
            other => panic!("expected InvalidDefinition, got {other:?}"),
        }
    }

    #[test]
    fn function_requires_handler() {
        let draft = KeywordDraft::function(["create"]).required([KeywordType::Shape]);
        let err = validate(KeywordType::Function, draft).unwrap_err();
        assert_eq!(reason(err), "missing handler");
    }

    #[test]
    fn function_required_defaults_to_empty() {
        let draft = KeywordDraft::function(["clear"]).exec(|_| Ok(None));
        let Payload::Function(spec) = validate(KeywordType::Function, draft).unwrap() else {
            panic!("expected function payload");
        };
        assert!(spec.required.is_empty());
        assert!(spec.optional.is_empty());
    }

    #[test]
    fn function_arity_must_cover_all_slots() {
        let draft = KeywordDraft::function(["write"])
            .required([KeywordType::String, KeywordType::Element])
            .handler(Handler::new(1, |_| Ok(None)));
        let err = validate(KeywordType::Function, draft).unwrap_err();
        assert!(reason(err).contains("handler takes 1 argument(s) but 2"));
    }

    #[test]
    fn function_slots_must_be_value_types() {
        let draft = KeywordDraft::function(["twice"])
            .required([KeywordType::Function])
            .exec(|_| Ok(None));
        let err = validate(KeywordType::Function, draft).unwrap_err();
        assert_eq!(reason(err), "Function cannot be a parameter type");
    }

    #[test]
    fn event_needs_exactly_one_target() {
        let err = validate(KeywordType::Event, KeywordDraft::event(["load"])).unwrap_err();
        assert_eq!(reason(err), "no bind target");

        let both = KeywordDraft::event(["load"])
            .bind_to(BindTarget::host("document"))
            .requires_bound_element();
        assert!(validate(KeywordType::Event, both).is_err());

        let ok = KeywordDraft::event(["click"]).requires_bound_element();
        assert!(matches!(
            validate(KeywordType::Event, ok).unwrap(),
            Payload::Event(EventSpec::BoundElement)
        ));
    }

    #[test]
    fn event_rejects_handler() {
        let draft = KeywordDraft::event(["load"])
            .bind_to(BindTarget::host("document"))
            .exec(|_| Ok(None));
        let err = validate(KeywordType::Event, draft).unwrap_err();
        assert_eq!(reason(err), "`handler` is only valid on FUNCTION keywords");
    }

    #[test]
    fn loop_and_conditional_are_unsupported() {
        let err = validate(KeywordType::Loop, KeywordDraft::new(KeywordType::Loop, ["repeat"]))
            .unwrap_err();
        assert_eq!(err, RegistrationError::UnsupportedType("Loop".into()));
        let err = validate(
            KeywordType::Conditional,
            KeywordDraft::new(KeywordType::Conditional, ["if"]),
        )
        .unwrap_err();
        assert_eq!(err, RegistrationError::UnsupportedType("Conditional".into()));
    }

    #[test]
    fn literal_accepts_plain_words() {
        let draft = KeywordDraft::new(KeywordType::Element, ["banner", "header"]);
        assert!(matches!(
            validate(KeywordType::Element, draft).unwrap(),
            Payload::Literal
        ));
    }

    #[test]
    fn keywords_must_be_single_words() {
        let draft = KeywordDraft::new(KeywordType::Element, ["banner", "top bit"]);
        let err = validate_keywords(&draft).unwrap_err();
        assert!(reason(err).contains("contains whitespace"));
        let draft = KeywordDraft::new(KeywordType::Element, [""]);
        assert_eq!(reason(validate_keywords(&draft).unwrap_err()), "blank keyword");
    }
}
