//! Renders the shipped templates through the real layouts

use async_trait::async_trait;
use athlete_sync::assets::layout::{layout_for, AssetKind};
use athlete_sync::assets::svg::{Document, NodePath};
use athlete_sync::assets::{AthleteCard, Compositor, FsTemplateSource, TemplateSource};
use athlete_sync::cli::types::{AthleteApiId, Sport, TeamApiId};
use athlete_sync::error::SyncError;
use athlete_sync::Result;
use futures::channel::oneshot;
use athlete_sync::storage::Team;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

fn template_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates")
}

fn compositor() -> Compositor {
    Compositor::new(Arc::new(FsTemplateSource::new(template_root())))
}

fn team(sport: Sport, key: &str) -> Team {
    Team {
        id: 1,
        api_id: TeamApiId::new(16),
        sport,
        name: "Chiefs".to_string(),
        key: key.to_string(),
        location: Some("Kansas City".to_string()),
        primary_color: "#E31837".to_string(),
        secondary_color: "#FFB612".to_string(),
    }
}

fn card(sport: Sport, jersey: Option<u32>) -> AthleteCard {
    AthleteCard::new(
        AthleteApiId::new(7),
        "Patrick",
        "Mahomes",
        Some("qb"),
        jersey,
        &team(sport, "KC"),
    )
}

async fn render(sport: Sport, kind: AssetKind, card: &AthleteCard) -> Document {
    let bytes = compositor().render(sport, kind, "KC", card).await.unwrap();
    let markup = String::from_utf8(bytes).unwrap();
    Document::parse(&markup).unwrap()
}

fn read(doc: &Document, sport: Sport, kind: AssetKind, path: &str) -> String {
    let binding = layout_for(sport)
        .template(kind)
        .bindings
        .iter()
        .find(|b| b.path == path)
        .unwrap();
    doc.read(&path.parse::<NodePath>().unwrap(), binding.target)
        .unwrap()
}

#[tokio::test]
async fn test_every_binding_resolves_in_shipped_templates() {
    let source = FsTemplateSource::new(template_root());
    for sport in [Sport::Mlb, Sport::Nfl] {
        for kind in AssetKind::ALL {
            let layout = layout_for(sport).template(kind);
            let markup = source
                .load(&layout.location.resolve("KC"))
                .await
                .unwrap();
            let doc = Document::parse(&markup).unwrap();
            for binding in layout.bindings {
                let path: NodePath = binding.path.parse().unwrap();
                assert!(
                    doc.read(&path, binding.target).is_ok(),
                    "{sport} {} template has no node at {}",
                    kind.label(),
                    binding.path
                );
            }
        }
    }
}

#[tokio::test]
async fn test_mlb_image_binds_every_field() {
    let doc = render(Sport::Mlb, AssetKind::Image, &card(Sport::Mlb, Some(15))).await;
    let image = AssetKind::Image;

    assert_eq!(read(&doc, Sport::Mlb, image, "g[0]/text[0]"), "PATRICK");
    assert_eq!(read(&doc, Sport::Mlb, image, "g[0]/text[1]"), "MAHOMES");
    assert_eq!(read(&doc, Sport::Mlb, image, "g[0]/text[2]"), "QB");
    assert_eq!(read(&doc, Sport::Mlb, image, "text"), "15");
    assert_eq!(read(&doc, Sport::Mlb, image, "path[10]"), "#E31837");
    assert_eq!(read(&doc, Sport::Mlb, image, "path[9]"), "#FFB612");
}

#[tokio::test]
async fn test_missing_jersey_renders_double_zero() {
    let doc = render(Sport::Mlb, AssetKind::Image, &card(Sport::Mlb, None)).await;
    assert_eq!(read(&doc, Sport::Mlb, AssetKind::Image, "text"), "00");

    let doc = render(Sport::Mlb, AssetKind::Animation, &card(Sport::Mlb, Some(0))).await;
    assert_eq!(
        read(&doc, Sport::Mlb, AssetKind::Animation, "g[4]/g[2]/g/text/tspan"),
        "00"
    );
}

#[tokio::test]
async fn test_mlb_animation_appends_fragment_inside_root() {
    let bytes = compositor()
        .render(Sport::Mlb, AssetKind::Animation, "NYY", &card(Sport::Mlb, Some(15)))
        .await
        .unwrap();
    let markup = String::from_utf8(bytes).unwrap();

    let style = markup.find("<style>").unwrap();
    let close = markup.rfind("</svg>").unwrap();
    assert!(style < close);
    assert!(markup.contains("<![CDATA[MAHOMES]]>"));

    // The fragment must not break the document.
    let doc = Document::parse(&markup).unwrap();
    assert_eq!(doc.root().unwrap().name, "svg");
}

#[tokio::test]
async fn test_nfl_uses_per_team_templates() {
    let doc = render(Sport::Nfl, AssetKind::Animation, &card(Sport::Nfl, Some(15))).await;
    let kind = AssetKind::Animation;

    assert_eq!(read(&doc, Sport::Nfl, kind, "g[5]/text[0]/tspan"), "");
    assert_eq!(read(&doc, Sport::Nfl, kind, "g[5]/text[3]/tspan"), "PATRICK");
    assert_eq!(read(&doc, Sport::Nfl, kind, "g[5]/text[5]/tspan"), "MAHOMES");
    assert_eq!(read(&doc, Sport::Nfl, kind, "g[5]/g[0]/text[1]/tspan"), "QB");

    let result = compositor().render(
        Sport::Nfl,
        AssetKind::Image,
        "XX",
        &card(Sport::Nfl, Some(15)),
    )
    .await;
    assert!(matches!(result, Err(SyncError::TemplateMissing { .. })));
}

#[tokio::test]
async fn test_untouched_nodes_survive() {
    let bytes = compositor()
        .render(Sport::Nfl, AssetKind::Image, "KC", &card(Sport::Nfl, Some(15)))
        .await
        .unwrap();
    let markup = String::from_utf8(bytes).unwrap();

    assert!(markup.contains(r##"<circle cx="275" cy="250" r="150" fill="#ffffff" opacity="0.15"/>"##));
    assert!(markup.contains(">KANSAS CITY<"));
    assert!(!markup.contains("PLACEHOLDER"));
}

/// Holds the first load until the gate opens.
struct GatedSource {
    inner: FsTemplateSource,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

#[async_trait]
impl TemplateSource for GatedSource {
    async fn load(&self, relative: &str) -> Result<Arc<str>> {
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.await.unwrap();
        }
        self.inner.load(relative).await
    }
}

#[tokio::test(flavor = "current_thread")]
async fn test_render_yields_while_template_loads() {
    let (open, gate) = oneshot::channel();
    let compositor = Compositor::new(Arc::new(GatedSource {
        inner: FsTemplateSource::new(template_root()),
        gate: Mutex::new(Some(gate)),
    }));
    let card = card(Sport::Nfl, Some(15));

    // On a single thread the gate can only open if the pending load yields.
    let (rendered, ()) = futures::join!(
        compositor.render(Sport::Nfl, AssetKind::Image, "KC", &card),
        async move { open.send(()).unwrap() },
    );
    let markup = String::from_utf8(rendered.unwrap()).unwrap();
    assert!(markup.contains("MAHOMES"));
}
