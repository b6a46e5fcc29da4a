use cf_core::FunnelError;
use cf_parser::MarkupElement;

pub(crate) fn expect_attributes(node: &MarkupElement, allowed: &[&str]) -> Result<(), FunnelError> {
    for name in node.attributes.keys() {
        if !allowed.contains(&name.as_str()) {
            return Err(FunnelError::with_span(
                "FUNNEL_ATTR_UNKNOWN",
                format!(
                    "Attribute \"{}\" is not allowed on <{}>. Allowed: {}.",
                    name,
                    node.name,
                    allowed.join(", ")
                ),
                node.location.clone(),
            ));
        }
    }
    Ok(())
}

pub(crate) fn required_attr(node: &MarkupElement, name: &str) -> Result<String, FunnelError> {
    node.attr_trimmed(name)
        .map(str::to_string)
        .ok_or_else(|| {
            FunnelError::with_span(
                "FUNNEL_ATTR_REQUIRED",
                format!("<{}> requires attribute \"{}\".", node.name, name),
                node.location.clone(),
            )
        })
}

pub(crate) fn optional_attr(node: &MarkupElement, name: &str) -> Option<String> {
    node.attr_trimmed(name).map(str::to_string)
}

pub(crate) fn millis_attr(node: &MarkupElement, name: &str) -> Result<Option<u64>, FunnelError> {
    let Some(raw) = node.attr_trimmed(name) else {
        return Ok(None);
    };
    raw.parse::<u64>().map(Some).map_err(|_| {
        FunnelError::with_span(
            "FUNNEL_ATTR_INVALID",
            format!(
                "Attribute \"{}\" on <{}> must be a non-negative integer of milliseconds, got \"{}\".",
                name, node.name, raw
            ),
            node.location.clone(),
        )
    })
}

pub(crate) fn bool_attr(node: &MarkupElement, name: &str) -> Result<bool, FunnelError> {
    match node.attr_trimmed(name) {
        None => Ok(false),
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(raw) => Err(FunnelError::with_span(
            "FUNNEL_ATTR_INVALID",
            format!(
                "Attribute \"{}\" on <{}> must be \"true\" or \"false\", got \"{}\".",
                name, node.name, raw
            ),
            node.location.clone(),
        )),
    }
}
