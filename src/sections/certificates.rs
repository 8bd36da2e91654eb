//! Certificate entries: name and date, issuer, optional description.

use super::RenderContext;
use crate::cv_data::Certificate;
use crate::style::{ComputedStyle, JustifyContent};
use crate::view::ViewNode;

/// Name and date on one line, issuer and optional description below.
pub fn render(items: &[Certificate], ctx: &RenderContext<'_>, base: &ComputedStyle) -> Vec<ViewNode> {
    let text = ComputedStyle::text_from(base);
    let muted = if ctx.ats() { text.color } else { ctx.secondary() };

    items
        .iter()
        .map(|cert| {
            let mut children = vec![ViewNode::element(
                ComputedStyle::default()
                    .row()
                    .wrap()
                    .justify(JustifyContent::SpaceBetween)
                    .gap(8.0),
                vec![
                    ViewNode::text(&cert.name, text.clone().bold()),
                    ViewNode::text(
                        &cert.date,
                        text.clone().font_size(base.font_size * 0.85).color(muted),
                    ),
                ],
            )];
            if !cert.issuer.trim().is_empty() {
                children.push(ViewNode::text(&cert.issuer, text.clone().color(muted)));
            }
            if let Some(desc) = cert.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
                children.push(ViewNode::text(desc, text.clone().font_size(base.font_size * 0.92)));
            }
            ViewNode::element(
                ComputedStyle::default().column().gap(2.0).margin_bottom(8.0),
                children,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::ctx;
    use super::*;
    use crate::cv_data::Translations;
    use crate::document::GlobalSettings;

    #[test]
    fn description_is_optional() {
        let settings = GlobalSettings::default();
        let t = Translations::default();
        let certs = [
            Certificate {
                name: "CKA".into(),
                issuer: "CNCF".into(),
                date: "2023".into(),
                description: None,
            },
            Certificate {
                name: "AWS SA".into(),
                issuer: "Amazon".into(),
                date: "2021".into(),
                description: Some("Associate".into()),
            },
        ];
        let nodes = render(&certs, &ctx(&settings, &t), &ComputedStyle::default());
        assert_eq!(nodes[0].text_content(), "CKA\n2023\nCNCF");
        assert_eq!(nodes[1].text_content(), "AWS SA\n2021\nAmazon\nAssociate");
    }
}
