use crate::dom::{Dom, NodeId};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorAttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SelectorStep {
    pub(crate) tag: Option<String>,
    pub(crate) universal: bool,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<SelectorAttrCondition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SelectorCombinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPart {
    pub(crate) step: SelectorStep,
    // Relation to previous (left) selector part.
    pub(crate) combinator: Option<SelectorCombinator>,
}

pub(crate) fn parse_selector_chain(selector: &str) -> Result<Vec<SelectorPart>> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    let tokens = tokenize_selector(selector)?;
    let mut parts = Vec::new();
    let mut pending_combinator: Option<SelectorCombinator> = None;

    for token in tokens {
        if token == ">" {
            if pending_combinator.is_some() || parts.is_empty() {
                return Err(Error::UnsupportedSelector(selector.into()));
            }
            pending_combinator = Some(SelectorCombinator::Child);
            continue;
        }

        let step = parse_selector_step(&token)?;
        let combinator = if parts.is_empty() {
            None
        } else {
            Some(pending_combinator.take().unwrap_or(SelectorCombinator::Descendant))
        };
        parts.push(SelectorPart { step, combinator });
    }

    if pending_combinator.is_some() || parts.is_empty() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }
    Ok(parts)
}

fn tokenize_selector(selector: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;
    let mut quote: Option<char> = None;

    for ch in selector.chars() {
        if let Some(open) = quote {
            current.push(ch);
            if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' if in_brackets => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                if in_brackets {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                in_brackets = true;
                current.push(ch);
            }
            ']' => {
                if !in_brackets {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                in_brackets = false;
                current.push(ch);
            }
            '>' if !in_brackets => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(">".into());
            }
            ch if ch.is_whitespace() && !in_brackets => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            '+' | '~' | ':' | ',' if !in_brackets => {
                return Err(Error::UnsupportedSelector(selector.into()));
            }
            _ => current.push(ch),
        }
    }

    if in_brackets || quote.is_some() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

fn parse_selector_step(token: &str) -> Result<SelectorStep> {
    let mut step = SelectorStep::default();
    let chars: Vec<char> = token.chars().collect();
    let mut i = 0usize;

    if i < chars.len() && chars[i] == '*' {
        step.universal = true;
        i += 1;
    } else if i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '-') {
        let start = i;
        while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '-') {
            i += 1;
        }
        step.tag = Some(chars[start..i].iter().collect::<String>().to_ascii_lowercase());
    }

    while i < chars.len() {
        match chars[i] {
            '#' => {
                i += 1;
                let start = i;
                while i < chars.len() && is_name_char(chars[i]) {
                    i += 1;
                }
                if start == i {
                    return Err(Error::UnsupportedSelector(token.into()));
                }
                step.id = Some(chars[start..i].iter().collect());
            }
            '.' => {
                i += 1;
                let start = i;
                while i < chars.len() && is_name_char(chars[i]) {
                    i += 1;
                }
                if start == i {
                    return Err(Error::UnsupportedSelector(token.into()));
                }
                step.classes.push(chars[start..i].iter().collect());
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|ch| *ch == ']')
                    .map(|offset| i + offset)
                    .ok_or_else(|| Error::UnsupportedSelector(token.into()))?;
                let body: String = chars[i + 1..close].iter().collect();
                step.attrs.push(parse_attr_condition(&body, token)?);
                i = close + 1;
            }
            _ => return Err(Error::UnsupportedSelector(token.into())),
        }
    }

    if !step.universal
        && step.tag.is_none()
        && step.id.is_none()
        && step.classes.is_empty()
        && step.attrs.is_empty()
    {
        return Err(Error::UnsupportedSelector(token.into()));
    }
    Ok(step)
}

fn parse_attr_condition(body: &str, token: &str) -> Result<SelectorAttrCondition> {
    let body = body.trim();
    if body.is_empty() {
        return Err(Error::UnsupportedSelector(token.into()));
    }
    let Some((key, value)) = body.split_once('=') else {
        return Ok(SelectorAttrCondition::Exists {
            key: body.to_ascii_lowercase(),
        });
    };
    let key = key.trim().to_ascii_lowercase();
    if key.is_empty() || key.ends_with(['^', '$', '*', '|', '~']) {
        return Err(Error::UnsupportedSelector(token.into()));
    }
    let mut value = value.trim();
    if (value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2)
        || (value.starts_with('"') && value.ends_with('"') && value.len() >= 2)
    {
        value = &value[1..value.len() - 1];
    }
    Ok(SelectorAttrCondition::Eq {
        key,
        value: value.to_string(),
    })
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

pub(crate) fn matches_step(dom: &Dom, node_id: NodeId, step: &SelectorStep) -> bool {
    let Some(tag_name) = dom.tag_name(node_id) else {
        return false;
    };
    if let Some(tag) = &step.tag {
        if !tag_name.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(id) = &step.id {
        if dom.attr(node_id, "id").as_deref() != Some(id.as_str()) {
            return false;
        }
    }
    for class in &step.classes {
        if !dom.has_class(node_id, class) {
            return false;
        }
    }
    for condition in &step.attrs {
        match condition {
            SelectorAttrCondition::Exists { key } => {
                if dom.attr(node_id, key).is_none() {
                    return false;
                }
            }
            SelectorAttrCondition::Eq { key, value } => {
                if dom.attr(node_id, key).as_deref() != Some(value.as_str()) {
                    return false;
                }
            }
        }
    }
    true
}

pub(crate) fn matches_chain(dom: &Dom, node_id: NodeId, parts: &[SelectorPart]) -> bool {
    let Some((last, prefix)) = parts.split_last() else {
        return false;
    };
    if !matches_step(dom, node_id, &last.step) {
        return false;
    }
    if prefix.is_empty() {
        return true;
    }
    match last.combinator {
        None => true,
        Some(SelectorCombinator::Child) => dom
            .parent(node_id)
            .map(|parent| matches_chain(dom, parent, prefix))
            .unwrap_or(false),
        Some(SelectorCombinator::Descendant) => {
            let mut cursor = dom.parent(node_id);
            while let Some(current) = cursor {
                if matches_chain(dom, current, prefix) {
                    return true;
                }
                cursor = dom.parent(current);
            }
            false
        }
    }
}

/// All connected elements matching `selector`, in document order.
pub(crate) fn select_all(dom: &Dom, selector: &str) -> Result<Vec<NodeId>> {
    let parts = parse_selector_chain(selector)?;
    Ok(dom
        .element_descendants(dom.root)
        .into_iter()
        .filter(|node| matches_chain(dom, *node, &parts))
        .collect())
}

/// All matching elements scoped to descendants of `scope`.
pub(crate) fn select_all_within(dom: &Dom, scope: NodeId, selector: &str) -> Result<Vec<NodeId>> {
    let parts = parse_selector_chain(selector)?;
    Ok(dom
        .element_descendants(scope)
        .into_iter()
        .filter(|node| matches_chain(dom, *node, &parts))
        .collect())
}

pub(crate) fn select_one(dom: &Dom, selector: &str) -> Result<NodeId> {
    select_all(dom, selector)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::SelectorNotFound(selector.into()))
}
