//! Per-sport template layouts.
//!
//! Each layout says where a template lives, which nodes receive which card
//! field, and how the uploaded object is keyed. Changing a template means
//! editing these tables, not the compositor.

use super::svg::Target;
use crate::cli::types::Sport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Image,
    Animation,
}

impl AssetKind {
    pub const ALL: [AssetKind; 2] = [AssetKind::Image, AssetKind::Animation];

    pub fn label(&self) -> &'static str {
        match self {
            AssetKind::Image => "image",
            AssetKind::Animation => "animation",
        }
    }
}

/// A value taken from an [`AthleteCard`](super::compose::AthleteCard).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardField {
    FirstName,
    LastName,
    Position,
    Jersey,
    PrimaryColor,
    SecondaryColor,
    /// Clears the node.
    Blank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldBinding {
    pub field: CardField,
    pub path: &'static str,
    pub target: Target,
}

const fn bind(field: CardField, path: &'static str, target: Target) -> FieldBinding {
    FieldBinding {
        field,
        path,
        target,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateLocation {
    /// One template shared by every team.
    Fixed(&'static str),
    /// One template per team, at `<dir>/<TEAM_KEY>.svg`.
    PerTeam(&'static str),
}

impl TemplateLocation {
    /// Template path relative to the template root.
    pub fn resolve(&self, team_key: &str) -> String {
        match self {
            TemplateLocation::Fixed(file) => (*file).to_string(),
            TemplateLocation::PerTeam(dir) => format!("{dir}/{team_key}.svg"),
        }
    }
}

/// How the object key's file name is derived from the athlete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScheme {
    /// `<id>.svg`
    IdOnly,
    /// `<id>-<first>-<last>.svg`, names lower-cased and slugified.
    IdAndName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateLayout {
    pub location: TemplateLocation,
    pub root: &'static str,
    pub bindings: &'static [FieldBinding],
    /// Markup appended inside the root element after bindings are applied.
    pub fragment: Option<&'static str>,
    pub key_prefix: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SportLayout {
    pub sport: Sport,
    pub image: TemplateLayout,
    pub animation: TemplateLayout,
    pub key_scheme: KeyScheme,
}

impl SportLayout {
    pub fn template(&self, kind: AssetKind) -> &TemplateLayout {
        match kind {
            AssetKind::Image => &self.image,
            AssetKind::Animation => &self.animation,
        }
    }
}

const FILL: Target = Target::Attribute("fill");

static MLB_IMAGE_BINDINGS: [FieldBinding; 6] = [
    bind(CardField::PrimaryColor, "path[10]", FILL),
    bind(CardField::SecondaryColor, "path[9]", FILL),
    bind(CardField::FirstName, "g[0]/text[0]", Target::Text),
    bind(CardField::LastName, "g[0]/text[1]", Target::Text),
    bind(CardField::Position, "g[0]/text[2]", Target::Text),
    bind(CardField::Jersey, "text", Target::Text),
];

static MLB_ANIMATION_BINDINGS: [FieldBinding; 8] = [
    bind(CardField::FirstName, "g[4]/g[3]/text[0]/tspan", Target::CData),
    bind(CardField::FirstName, "g[4]/g[3]/g/text[0]/tspan", Target::CData),
    bind(CardField::LastName, "g[4]/g[3]/text[1]/tspan", Target::CData),
    bind(CardField::LastName, "g[4]/g[3]/g/text[1]/tspan", Target::CData),
    bind(CardField::PrimaryColor, "g[1]/g[2]/g/path", FILL),
    bind(CardField::SecondaryColor, "g[1]/g[0]/g/path", FILL),
    bind(CardField::Jersey, "g[4]/g[2]/g/text/tspan", Target::CData),
    bind(CardField::Position, "g[4]/g[0]/g/g/text/tspan", Target::CData),
];

static NFL_IMAGE_BINDINGS: [FieldBinding; 4] = [
    bind(CardField::FirstName, "g[5]/text[2]", Target::Text),
    bind(CardField::LastName, "g[5]/text[3]", Target::Text),
    bind(CardField::Position, "g[5]/text[1]", Target::Text),
    bind(CardField::Blank, "g[5]/text[0]", Target::Text),
];

static NFL_ANIMATION_BINDINGS: [FieldBinding; 8] = [
    bind(CardField::Blank, "g[5]/text[0]/tspan", Target::CData),
    bind(CardField::Blank, "g[5]/text[1]/tspan", Target::CData),
    bind(CardField::FirstName, "g[5]/text[2]/tspan", Target::CData),
    bind(CardField::FirstName, "g[5]/text[3]/tspan", Target::CData),
    bind(CardField::LastName, "g[5]/text[4]/tspan", Target::CData),
    bind(CardField::LastName, "g[5]/text[5]/tspan", Target::CData),
    bind(CardField::Position, "g[5]/g[0]/text[0]/tspan", Target::CData),
    bind(CardField::Position, "g[5]/g[0]/text[1]/tspan", Target::CData),
];

static MLB_LAYOUT: SportLayout = SportLayout {
    sport: Sport::Mlb,
    image: TemplateLayout {
        location: TemplateLocation::Fixed("mlb/image.svg"),
        root: "svg",
        bindings: &MLB_IMAGE_BINDINGS,
        fragment: None,
        key_prefix: "media/athlete/mlb/",
    },
    animation: TemplateLayout {
        location: TemplateLocation::Fixed("mlb/animation.svg"),
        root: "svg",
        bindings: &MLB_ANIMATION_BINDINGS,
        fragment: Some("mlb/animation-fragment.svg"),
        key_prefix: "media/athlete_animations/mlb/",
    },
    key_scheme: KeyScheme::IdOnly,
};

static NFL_LAYOUT: SportLayout = SportLayout {
    sport: Sport::Nfl,
    image: TemplateLayout {
        location: TemplateLocation::PerTeam("nfl/images"),
        root: "svg",
        bindings: &NFL_IMAGE_BINDINGS,
        fragment: None,
        key_prefix: "media/athlete/nfl/images/",
    },
    animation: TemplateLayout {
        location: TemplateLocation::PerTeam("nfl/animations"),
        root: "svg",
        bindings: &NFL_ANIMATION_BINDINGS,
        fragment: None,
        key_prefix: "media/athlete/nfl/animations/",
    },
    key_scheme: KeyScheme::IdAndName,
};

pub fn layout_for(sport: Sport) -> &'static SportLayout {
    match sport {
        Sport::Mlb => &MLB_LAYOUT,
        Sport::Nfl => &NFL_LAYOUT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::svg::NodePath;

    #[test]
    fn test_every_binding_path_parses() {
        for sport in Sport::ALL {
            let layout = layout_for(sport);
            assert_eq!(layout.sport, sport);
            for kind in AssetKind::ALL {
                for binding in layout.template(kind).bindings {
                    assert!(
                        binding.path.parse::<NodePath>().is_ok(),
                        "{sport} {} binding {} does not parse",
                        kind.label(),
                        binding.path
                    );
                }
            }
        }
    }

    #[test]
    fn test_template_location_resolution() {
        let nfl = layout_for(Sport::Nfl);
        assert_eq!(nfl.image.location.resolve("KC"), "nfl/images/KC.svg");
        assert_eq!(
            nfl.animation.location.resolve("KC"),
            "nfl/animations/KC.svg"
        );

        let mlb = layout_for(Sport::Mlb);
        assert_eq!(mlb.image.location.resolve("NYY"), "mlb/image.svg");
        assert_eq!(mlb.animation.fragment, Some("mlb/animation-fragment.svg"));
    }

    #[test]
    fn test_key_prefixes() {
        assert_eq!(layout_for(Sport::Mlb).image.key_prefix, "media/athlete/mlb/");
        assert_eq!(
            layout_for(Sport::Mlb).animation.key_prefix,
            "media/athlete_animations/mlb/"
        );
        assert_eq!(layout_for(Sport::Nfl).key_scheme, KeyScheme::IdAndName);
    }
}
