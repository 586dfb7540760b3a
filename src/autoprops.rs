//! Auto-properties: the rule table matching a new or reloaded client's
//! class/role/title to an initial-state payload.
use bitflags::bitflags;
use regex::Regex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    client::{CfgDeny, ClassHint},
    wo::Layer,
    wo::SkipFlags,
    Rect,
};

bitflags! {
    /// When a rule is eligible to be applied.
    #[derive(Default)]
    pub struct ApplyScope: u16 {
        const APPLY_ON_START      = 1 << 0;
        const APPLY_ON_NEW        = 1 << 1;
        const APPLY_ON_RELOAD     = 1 << 2;
        const APPLY_ON_WORKSPACE  = 1 << 3;
        const APPLY_ON_TRANSIENT  = 1 << 4;
        const APPLY_ON_TITLE      = 1 << 5;
    }
}

/// A single regexp match against a client, with ICCCM's usual
/// case-sensitivity escape hatch.
#[derive(Debug, Clone)]
pub struct MatchPattern {
    pub pattern: Regex,
    pub case_sensitive: bool,
}

impl MatchPattern {
    pub fn new(pattern: &str, case_sensitive: bool) -> Result<Self, regex::Error> {
        let built = if case_sensitive {
            Regex::new(pattern)?
        } else {
            Regex::new(&format!("(?i){pattern}"))?
        };
        Ok(Self {
            pattern: built,
            case_sensitive,
        })
    }

    fn is_match(&self, haystack: &str) -> bool {
        self.pattern.is_match(haystack)
    }
}

/// The match predicate of a single rule: any combination of
/// class-instance, class-name, role and title.
#[derive(Debug, Clone, Default)]
pub struct MatchPredicate {
    pub class_instance: Option<MatchPattern>,
    pub class_name: Option<MatchPattern>,
    pub role: Option<MatchPattern>,
    pub title: Option<MatchPattern>,
}

impl MatchPredicate {
    /// A predicate component matches if absent (not constrained) or if
    /// its pattern matches the corresponding client field; the whole
    /// predicate matches only if every present component matches.
    fn matches(&self, class_hint: &ClassHint, role: Option<&str>, title: &str) -> bool {
        let check = |pat: &Option<MatchPattern>, value: &str| {
            pat.as_ref().map_or(true, |p| p.is_match(value))
        };

        check(&self.class_instance, &class_hint.instance)
            && check(&self.class_name, &class_hint.class)
            && check(&self.role, role.unwrap_or(""))
            && check(&self.title, title)
    }
}

/// Optional group-attach behaviour a rule may carry.
#[derive(Debug, Clone)]
pub struct GroupSpec {
    pub name: String,
    pub max: u32,
}

/// The action payload applied when a rule matches. Every field is
/// optional: only the bits a rule actually sets are realized, everything
/// else is left as the client's current/default state.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct AutoPropAction {
    pub workspace: Option<usize>,
    pub sticky: Option<bool>,
    pub shaded: Option<bool>,
    pub maximized_horz: Option<bool>,
    pub maximized_vert: Option<bool>,
    pub iconified: Option<bool>,
    pub fullscreen: Option<bool>,
    pub border: Option<bool>,
    pub titlebar: Option<bool>,
    pub geometry: Option<Rect>,
    pub layer: Option<Layer>,
    pub decor_name: Option<String>,
    pub skip: Option<SkipFlags>,
    pub focusable: Option<bool>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub group: Option<GroupSpec>,
    pub cfg_deny: Option<CfgDeny>,
    /// 0.0-1.0, published as an opacity hint on the frame's decoration.
    pub opacity: Option<f32>,
    pub place_new: Option<bool>,
}

/// One evaluated-in-order rule: a predicate, the scopes it is eligible
/// under, and the action payload to apply when both match.
pub struct AutoPropRule {
    pub predicate: MatchPredicate,
    pub scope: ApplyScope,
    pub action: AutoPropAction,
}

/// The ordered rule table. Rules are evaluated in
/// insertion order; the first whose predicate matches and whose scope
/// mask intersects the requested scope wins.
#[derive(Default)]
pub struct AutoProps {
    rules: Vec<AutoPropRule>,
}

impl AutoProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: AutoPropRule) {
        self.rules.push(rule);
    }

    /// Find the first rule that matches `class_hint`/`role`/`title` and is
    /// eligible under `scope`.
    pub fn matching(
        &self,
        class_hint: &ClassHint,
        role: Option<&str>,
        title: &str,
        scope: ApplyScope,
    ) -> Option<&AutoPropAction> {
        self.rules
            .iter()
            .find(|rule| rule.scope.intersects(scope) && rule.predicate.matches(class_hint, role, title))
            .map(|rule| &rule.action)
    }

    /// Every rule eligible under `scope`, in order, that matches — used
    /// by config reload which must re-evaluate every existing client
    /// rather than stop at the first hit within a scope change.
    pub fn all_matching<'a>(
        &'a self,
        class_hint: &'a ClassHint,
        role: Option<&'a str>,
        title: &'a str,
        scope: ApplyScope,
    ) -> impl Iterator<Item = &'a AutoPropAction> + 'a {
        self.rules
            .iter()
            .filter(move |rule| rule.scope.intersects(scope) && rule.predicate.matches(class_hint, role, title))
            .map(|rule| &rule.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hint(instance: &str, class: &str) -> ClassHint {
        ClassHint {
            instance: instance.into(),
            class: class.into(),
        }
    }

    #[test]
    fn matches_on_class_name_case_insensitively_by_default() {
        let mut props = AutoProps::new();
        props.push(AutoPropRule {
            predicate: MatchPredicate {
                class_name: Some(MatchPattern::new("^XTerm$", false).unwrap()),
                ..Default::default()
            },
            scope: ApplyScope::APPLY_ON_NEW,
            action: AutoPropAction {
                sticky: Some(true),
                ..Default::default()
            },
        });

        let hit = props.matching(&hint("xterm", "xterm"), None, "", ApplyScope::APPLY_ON_NEW);
        assert_eq!(hit.unwrap().sticky, Some(true));
    }

    #[test]
    fn scope_mismatch_is_not_applied() {
        let mut props = AutoProps::new();
        props.push(AutoPropRule {
            predicate: MatchPredicate {
                class_name: Some(MatchPattern::new("xterm", true).unwrap()),
                ..Default::default()
            },
            scope: ApplyScope::APPLY_ON_RELOAD,
            action: AutoPropAction::default(),
        });

        assert!(props
            .matching(&hint("xterm", "xterm"), None, "", ApplyScope::APPLY_ON_NEW)
            .is_none());
    }

    #[test]
    fn first_matching_rule_wins() {
        let mut props = AutoProps::new();
        props.push(AutoPropRule {
            predicate: MatchPredicate::default(),
            scope: ApplyScope::APPLY_ON_NEW,
            action: AutoPropAction {
                workspace: Some(1),
                ..Default::default()
            },
        });
        props.push(AutoPropRule {
            predicate: MatchPredicate::default(),
            scope: ApplyScope::APPLY_ON_NEW,
            action: AutoPropAction {
                workspace: Some(2),
                ..Default::default()
            },
        });

        let hit = props.matching(&hint("a", "b"), None, "", ApplyScope::APPLY_ON_NEW);
        assert_eq!(hit.unwrap().workspace, Some(1));
    }
}
