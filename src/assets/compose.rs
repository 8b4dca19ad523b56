//! Template compositing: load, bind card fields, serialize.

use std::sync::Arc;

use super::layout::{layout_for, AssetKind, CardField, TemplateLayout};
use super::svg::{Document, NodePath};
use super::templates::TemplateSource;
use crate::cli::types::{AthleteApiId, Sport};
use crate::provider::PlayerRecord;
use crate::storage::models::{Athlete, Team};
use crate::{error::SyncError, Result};

/// Jersey rendered when the provider has none.
pub const MISSING_JERSEY: &str = "00";

/// Display values for one athlete's assets, already normalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AthleteCard {
    pub api_id: AthleteApiId,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub jersey: String,
    pub primary_color: String,
    pub secondary_color: String,
}

impl AthleteCard {
    pub fn new(
        api_id: AthleteApiId,
        first_name: &str,
        last_name: &str,
        position: Option<&str>,
        jersey: Option<u32>,
        team: &Team,
    ) -> Self {
        Self {
            api_id,
            first_name: first_name.to_uppercase(),
            last_name: last_name.to_uppercase(),
            position: position.unwrap_or_default().to_uppercase(),
            jersey: match jersey {
                Some(n) if n > 0 => n.to_string(),
                _ => MISSING_JERSEY.to_string(),
            },
            primary_color: team.primary_color.clone(),
            secondary_color: team.secondary_color.clone(),
        }
    }

    pub fn from_player(player: &PlayerRecord, team: &Team) -> Self {
        Self::new(
            player.player_id,
            &player.first_name,
            &player.last_name,
            player.position.as_deref(),
            player.jersey_number(),
            team,
        )
    }

    pub fn from_athlete(athlete: &Athlete, team: &Team) -> Self {
        Self::new(
            athlete.api_id,
            &athlete.first_name,
            &athlete.last_name,
            athlete.position.as_deref(),
            athlete.jersey,
            team,
        )
    }

    pub fn value(&self, field: CardField) -> &str {
        match field {
            CardField::FirstName => &self.first_name,
            CardField::LastName => &self.last_name,
            CardField::Position => &self.position,
            CardField::Jersey => &self.jersey,
            CardField::PrimaryColor => &self.primary_color,
            CardField::SecondaryColor => &self.secondary_color,
            CardField::Blank => "",
        }
    }
}

/// Renders athlete cards into finished markup.
#[derive(Clone)]
pub struct Compositor {
    templates: Arc<dyn TemplateSource>,
}

impl Compositor {
    pub fn new(templates: Arc<dyn TemplateSource>) -> Self {
        Self { templates }
    }

    /// Render one asset for `card` from the sport's layout.
    ///
    /// `team_key` selects the template for per-team layouts and is ignored
    /// otherwise.
    pub async fn render(
        &self,
        sport: Sport,
        kind: AssetKind,
        team_key: &str,
        card: &AthleteCard,
    ) -> Result<Vec<u8>> {
        let layout = layout_for(sport).template(kind);
        let markup = self
            .templates
            .load(&layout.location.resolve(team_key))
            .await?;
        let mut out = apply_layout(&markup, layout, card)?;

        if let Some(fragment) = layout.fragment {
            let fragment = self.templates.load(fragment).await?;
            out = splice_before_root_close(&out, &fragment, layout.root)?;
        }
        Ok(out.into_bytes())
    }
}

/// Parse `markup`, write every binding of `layout`, and serialize.
pub fn apply_layout(markup: &str, layout: &TemplateLayout, card: &AthleteCard) -> Result<String> {
    let mut doc = Document::parse(markup)?;

    let root = doc.root().map(|r| r.name.as_str()).unwrap_or_default();
    if root != layout.root {
        return Err(SyncError::template_shape(
            "/",
            format!("expected <{}> root, found <{root}>", layout.root),
        ));
    }

    for binding in layout.bindings {
        let path: NodePath = binding.path.parse()?;
        doc.write(&path, binding.target, card.value(binding.field))?;
    }
    Ok(doc.to_markup())
}

/// Insert `fragment` immediately before the last `</root>` in `markup`.
pub fn splice_before_root_close(markup: &str, fragment: &str, root: &str) -> Result<String> {
    let close = format!("</{root}>");
    let at = markup
        .rfind(&close)
        .ok_or_else(|| SyncError::template_shape("/", format!("no closing {close}")))?;

    let mut out = String::with_capacity(markup.len() + fragment.len());
    out.push_str(&markup[..at]);
    out.push_str(fragment.trim_end());
    out.push_str(&markup[at..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::layout::{FieldBinding, TemplateLocation};
    use crate::assets::svg::Target;
    use crate::cli::types::TeamApiId;

    fn team() -> Team {
        Team {
            id: 1,
            api_id: TeamApiId::new(16),
            sport: Sport::Nfl,
            name: "Chiefs".to_string(),
            key: "KC".to_string(),
            location: Some("Kansas City".to_string()),
            primary_color: "#E31837".to_string(),
            secondary_color: "#FFB612".to_string(),
        }
    }

    static BINDINGS: [FieldBinding; 3] = [
        FieldBinding {
            field: CardField::LastName,
            path: "text[0]",
            target: Target::Text,
        },
        FieldBinding {
            field: CardField::Jersey,
            path: "text[1]",
            target: Target::Text,
        },
        FieldBinding {
            field: CardField::PrimaryColor,
            path: "rect",
            target: Target::Attribute("fill"),
        },
    ];

    static LAYOUT: TemplateLayout = TemplateLayout {
        location: TemplateLocation::Fixed("card.svg"),
        root: "svg",
        bindings: &BINDINGS,
        fragment: None,
        key_prefix: "media/",
    };

    #[test]
    fn test_card_normalises_values() {
        let card = AthleteCard::new(
            AthleteApiId::new(7),
            "Patrick",
            "Mahomes",
            Some("qb"),
            Some(15),
            &team(),
        );
        assert_eq!(card.first_name, "PATRICK");
        assert_eq!(card.last_name, "MAHOMES");
        assert_eq!(card.position, "QB");
        assert_eq!(card.jersey, "15");
        assert_eq!(card.value(CardField::PrimaryColor), "#E31837");
        assert_eq!(card.value(CardField::Blank), "");
    }

    #[test]
    fn test_missing_or_zero_jersey_renders_placeholder() {
        for jersey in [None, Some(0)] {
            let card = AthleteCard::new(AthleteApiId::new(7), "A", "B", None, jersey, &team());
            assert_eq!(card.jersey, MISSING_JERSEY);
            assert_eq!(card.position, "");
        }
    }

    #[test]
    fn test_apply_layout_writes_bindings() {
        let card = AthleteCard::new(AthleteApiId::new(7), "Pat", "Doe", None, None, &team());
        let markup = r##"<svg><rect fill="#000"/><text>X</text><text>Y</text></svg>"##;
        let out = apply_layout(markup, &LAYOUT, &card).unwrap();
        assert_eq!(
            out,
            r##"<svg><rect fill="#E31837"/><text>DOE</text><text>00</text></svg>"##
        );
    }

    #[test]
    fn test_apply_layout_rejects_wrong_root() {
        let card = AthleteCard::new(AthleteApiId::new(7), "Pat", "Doe", None, None, &team());
        let result = apply_layout("<g><text/></g>", &LAYOUT, &card);
        assert!(matches!(result, Err(SyncError::TemplateShape { .. })));
    }

    #[test]
    fn test_apply_layout_reports_missing_node() {
        let card = AthleteCard::new(AthleteApiId::new(7), "Pat", "Doe", None, None, &team());
        let result = apply_layout("<svg><rect/><text/></svg>", &LAYOUT, &card);
        match result {
            Err(SyncError::TemplateShape { path, .. }) => assert_eq!(path, "text[1]"),
            other => panic!("Expected TemplateShape, got {other:?}"),
        }
    }

    #[test]
    fn test_splice_uses_last_closing_tag() {
        let out = splice_before_root_close(
            "<svg><svg></svg><g/></svg>",
            "<style>.a{}</style>\n",
            "svg",
        )
        .unwrap();
        assert_eq!(out, "<svg><svg></svg><g/><style>.a{}</style></svg>");

        assert!(splice_before_root_close("<g/>", "x", "svg").is_err());
    }
}
