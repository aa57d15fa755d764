//! Static parameter contract for every action kind.

use crate::error::FailureReason;
use crate::script::{ActionKind, StructuredAction, keys};

#[derive(Debug)]
pub struct ActionSpec {
    pub kind: ActionKind,
    pub params: ParamContract,
}

/// Required, alternative and optional parameters of one action kind.
#[derive(Debug, Clone, Copy)]
pub struct ParamContract {
    /// Must be present and non-blank.
    pub required: &'static [&'static str],
    /// Must be present, but an empty string is a valid value.
    pub required_allow_empty: &'static [&'static str],
    /// At least one key of each group must be present and non-blank.
    pub one_of: &'static [&'static [&'static str]],
    pub optional: &'static [&'static str],
    /// Parameters that must parse as a positive integer.
    pub positive_integers: &'static [&'static str],
}

const ELEMENT_KEYS: &[&str] = &[
    keys::ELEMENT_RESOURCE_ID,
    keys::ELEMENT_TEXT_TO_CLICK,
    keys::ELEMENT_CONTENT_DESCRIPTION,
];

const NONE: ParamContract = ParamContract {
    required: &[],
    required_allow_empty: &[],
    one_of: &[],
    optional: &[],
    positive_integers: &[],
};

const fn spec(kind: ActionKind, params: ParamContract) -> ActionSpec {
    ActionSpec { kind, params }
}

static SCHEMA: [ActionSpec; 14] = [
    spec(
        ActionKind::OpenApp,
        ParamContract {
            one_of: &[&[keys::APP_NAME, keys::PACKAGE_NAME]],
            ..NONE
        },
    ),
    spec(
        ActionKind::LaunchUrl,
        ParamContract {
            required: &[keys::URL],
            ..NONE
        },
    ),
    spec(
        ActionKind::TypeText,
        ParamContract {
            required_allow_empty: &[keys::TEXT_TO_TYPE],
            optional: &[keys::ELEMENT_RESOURCE_ID, keys::ELEMENT_TEXT_TO_CLICK],
            ..NONE
        },
    ),
    spec(
        ActionKind::ClickElement,
        ParamContract {
            one_of: &[ELEMENT_KEYS],
            ..NONE
        },
    ),
    spec(
        ActionKind::ScrollView,
        ParamContract {
            required: &[keys::SCROLL_DIRECTION],
            optional: &[keys::SCROLL_TARGET_RESOURCE_ID, keys::SCROLL_TARGET_TEXT],
            ..NONE
        },
    ),
    spec(ActionKind::NavigateHome, NONE),
    spec(ActionKind::NavigateBack, NONE),
    spec(ActionKind::PullDownNotificationBar, NONE),
    spec(ActionKind::TakeScreenshot, NONE),
    spec(
        ActionKind::Wait,
        ParamContract {
            required: &[keys::WAIT_DURATION_MS],
            positive_integers: &[keys::WAIT_DURATION_MS],
            ..NONE
        },
    ),
    spec(
        ActionKind::SendTextMessage,
        ParamContract {
            required_allow_empty: &[keys::MESSAGE_BODY],
            one_of: &[&[keys::RECIPIENT_NUMBER, keys::RECIPIENT_NAME]],
            ..NONE
        },
    ),
    spec(
        ActionKind::GetTextFromElement,
        ParamContract {
            one_of: &[ELEMENT_KEYS],
            ..NONE
        },
    ),
    spec(
        ActionKind::WaitForElement,
        ParamContract {
            required: &[keys::TIMEOUT_MS],
            one_of: &[ELEMENT_KEYS],
            positive_integers: &[keys::TIMEOUT_MS],
            ..NONE
        },
    ),
    spec(
        ActionKind::PerformAccessibilityAction,
        ParamContract {
            required: &[keys::ACTION_TO_PERFORM],
            one_of: &[ELEMENT_KEYS],
            optional: &[keys::TEXT_TO_TYPE],
            ..NONE
        },
    ),
];

/// The whole table, in declaration order.
pub fn all() -> &'static [ActionSpec] {
    &SCHEMA
}

pub fn spec_for(kind: &ActionKind) -> Option<&'static ActionSpec> {
    SCHEMA.iter().find(|s| &s.kind == kind)
}

/// Check an action against its kind's contract.
pub fn validate(action: &StructuredAction) -> Result<(), FailureReason> {
    let spec = spec_for(&action.kind).ok_or_else(|| FailureReason::UnknownActionKind {
        kind: action.kind.to_string(),
    })?;
    let contract = &spec.params;
    let params = action.params();

    for key in contract.required {
        if !params.has(key) {
            return Err(FailureReason::missing(key));
        }
    }
    for key in contract.required_allow_empty {
        if params.raw(key).is_none() {
            return Err(FailureReason::missing(key));
        }
    }
    for group in contract.one_of {
        if !group.iter().any(|k| params.has(k)) {
            return Err(FailureReason::missing(&group.join(" | ")));
        }
    }
    for key in contract.positive_integers {
        if let Some(value) = params.get(key) {
            match value.trim().parse::<u64>() {
                Ok(n) if n > 0 => {}
                _ => return Err(FailureReason::invalid(key, value)),
            }
        }
    }
    Ok(())
}

/// Parse a positive millisecond parameter. Callers run [`validate`] first.
pub fn positive_millis(action: &StructuredAction, key: &str) -> Result<u64, FailureReason> {
    let value = action
        .params()
        .get(key)
        .ok_or_else(|| FailureReason::missing(key))?;
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(FailureReason::invalid(key, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_kind_has_a_spec() {
        for kind in ActionKind::KNOWN {
            assert!(spec_for(&kind).is_some(), "{kind} missing from schema");
        }
        assert!(spec_for(&ActionKind::Unknown("X".into())).is_none());
    }

    #[test]
    fn one_of_group_accepts_any_member() {
        let click = StructuredAction::new(ActionKind::ClickElement)
            .with_param(keys::ELEMENT_CONTENT_DESCRIPTION, "Send");
        assert!(validate(&click).is_ok());

        let bare = StructuredAction::new(ActionKind::ClickElement);
        assert!(matches!(
            validate(&bare),
            Err(FailureReason::MissingParameter { .. })
        ));
    }

    #[test]
    fn empty_text_to_type_is_allowed() {
        let clear = StructuredAction::new(ActionKind::TypeText).with_param(keys::TEXT_TO_TYPE, "");
        assert!(validate(&clear).is_ok());
        let missing = StructuredAction::new(ActionKind::TypeText);
        assert_eq!(
            validate(&missing),
            Err(FailureReason::missing(keys::TEXT_TO_TYPE))
        );
    }

    #[test]
    fn wait_duration_must_be_positive() {
        for bad in ["0", "-5", "soon", "1.5"] {
            let wait = StructuredAction::new(ActionKind::Wait).with_param(keys::WAIT_DURATION_MS, bad);
            assert_eq!(
                validate(&wait),
                Err(FailureReason::invalid(keys::WAIT_DURATION_MS, bad)),
                "{bad}"
            );
        }
        let ok = StructuredAction::new(ActionKind::Wait).with_param(keys::WAIT_DURATION_MS, "2000");
        assert!(validate(&ok).is_ok());
        assert_eq!(positive_millis(&ok, keys::WAIT_DURATION_MS), Ok(2000));
    }

    #[test]
    fn unknown_kind_fails_validation() {
        let action = StructuredAction::new(ActionKind::from("TOGGLE_WIFI"));
        assert_eq!(
            validate(&action),
            Err(FailureReason::UnknownActionKind {
                kind: "TOGGLE_WIFI".into()
            })
        );
    }
}
