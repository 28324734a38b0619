use crate::config::{Config, RenderConfig};
use crate::geometry::{BoundingBox, GeometryProvider, NodeRef};
use crate::layout::{ConnectorDescriptor, ConnectorKind, Generations};
use crate::member::Member;
use crate::presentation::PresentationState;
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

/// Everything needed to draw one frame of the tree.
pub struct TreeScene<'a> {
    pub generations: &'a Generations,
    pub connectors: &'a [ConnectorDescriptor],
    pub geometry: &'a dyn GeometryProvider,
    /// Untransformed content size.
    pub width: f32,
    pub height: f32,
    /// Active generation and state when presenting.
    pub presentation: Option<(i64, PresentationState)>,
}

pub fn render_svg(scene: &TreeScene<'_>, theme: &Theme, config: &Config) -> String {
    let mut svg = String::new();
    let (width, height) = match scene.presentation {
        Some(_) => (config.render.width, config.render.height),
        None => (scene.width.max(200.0), scene.height.max(200.0)),
    };

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    match scene.presentation {
        Some((_, state)) => {
            // Scale about the top-centre of the content, like a CSS `origin-top`.
            let cx = scene.width / 2.0;
            let offset_x = (width - scene.width) / 2.0;
            svg.push_str(&format!(
                "<g transform=\"translate({:.2} {:.2}) translate({cx:.2} 0) scale({:.4}) translate({:.2} 0)\">",
                offset_x,
                state.transform.translate_y,
                state.transform.scale,
                -cx
            ));
        }
        None => svg.push_str("<g>"),
    }

    svg.push_str("<g class=\"connectors\">");
    for connector in scene.connectors {
        let dash = match connector.kind {
            ConnectorKind::Spouse => String::new(),
            _ => format!(" stroke-dasharray=\"{}\"", theme.line_dasharray),
        };
        let stroke = match connector.kind {
            ConnectorKind::Spouse => &theme.spouse_line_color,
            _ => &theme.line_color,
        };
        svg.push_str(&format!(
            "<path id=\"{}\" data-kind=\"{}\" d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"{dash}/>",
            escape_xml(&connector.id),
            connector.kind.as_str(),
            connector.path.to_svg_d(),
            stroke,
            theme.line_width,
        ));
    }
    svg.push_str("</g>");

    for (generation, members) in scene.generations.iter() {
        let opacity = match scene.presentation {
            Some((active, _)) if active != generation => config.presentation.inactive_opacity,
            _ => 1.0,
        };
        svg.push_str(&format!(
            "<g id=\"gen-row-{generation}\" opacity=\"{opacity}\">"
        ));
        for member in members {
            let Some(bbox) = scene.geometry.bounding_box_of(NodeRef::Member(&member.id)) else {
                continue;
            };
            svg.push_str(&member_card_svg(member, &bbox, theme, config));
        }
        svg.push_str("</g>");
    }

    svg.push_str("</g>");
    svg.push_str("</svg>");
    svg
}

fn member_card_svg(member: &Member, bbox: &BoundingBox, theme: &Theme, config: &Config) -> String {
    let mut out = String::new();
    let avatar = config.layout.avatar_size.min(bbox.width()).min(bbox.height());
    let radius = avatar / 2.0;
    let cx = bbox.center_x();
    let cy = bbox.top + radius;

    out.push_str(&format!("<g id=\"node-{}\">", escape_xml(member.id.as_str())));
    out.push_str(&format!(
        "<circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{radius:.2}\" fill=\"{}\" stroke=\"#FFFFFF\" stroke-width=\"4\"/>",
        theme.avatar_fill
    ));
    let initial = member
        .name
        .chars()
        .next()
        .map(|ch| ch.to_string())
        .unwrap_or_else(|| "?".to_string());
    out.push_str(&format!(
        "<text x=\"{cx:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" font-weight=\"bold\" fill=\"{}\">{}</text>",
        cy + theme.font_size * 0.5,
        theme.font_family,
        theme.font_size * 1.4,
        theme.avatar_text_color,
        escape_xml(&initial)
    ));
    if let Some(url) = &member.image_url {
        let clip_id = format!("avatar-clip-{}", escape_xml(member.id.as_str()));
        out.push_str(&format!(
            "<clipPath id=\"{clip_id}\"><circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{radius:.2}\"/></clipPath>"
        ));
        out.push_str(&format!(
            "<image href=\"{}\" x=\"{:.2}\" y=\"{:.2}\" width=\"{avatar:.2}\" height=\"{avatar:.2}\" clip-path=\"url(#{clip_id})\" preserveAspectRatio=\"xMidYMid slice\"/>",
            escape_xml(url),
            cx - radius,
            bbox.top
        ));
    }

    let info_top = bbox.top + avatar + 8.0;
    let info_height = (bbox.bottom - info_top).max(theme.font_size * 2.5);
    out.push_str(&format!(
        "<rect x=\"{:.2}\" y=\"{info_top:.2}\" width=\"{:.2}\" height=\"{info_height:.2}\" rx=\"8\" ry=\"8\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>",
        bbox.left,
        bbox.width(),
        theme.card_fill,
        theme.card_border
    ));
    let name_y = info_top + info_height / 2.0 - 2.0;
    out.push_str(&format!(
        "<text x=\"{cx:.2}\" y=\"{name_y:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" font-weight=\"bold\" fill=\"{}\">{}</text>",
        theme.font_family,
        theme.font_size,
        theme.name_color,
        escape_xml(&member.name)
    ));
    if !member.relation.is_empty() {
        out.push_str(&format!(
            "<text x=\"{cx:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            name_y + theme.font_size * 1.2,
            theme.font_family,
            theme.font_size * 0.85,
            theme.relation_color,
            escape_xml(&member.relation.to_uppercase())
        ));
    }
    out.push_str("</g>");
    out
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .ok_or_else(|| anyhow::anyhow!("Invalid render size"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::geometry::ViewportBox;
    use crate::layout::compute_static_tree;
    use crate::presentation::{Navigator, ViewMode};

    #[test]
    fn render_svg_basic() {
        let members = crate::demo::demo_members();
        let config = Config::default();
        let (tree, rows) = compute_static_tree(
            &members,
            &config.layout,
            &config.router,
            ViewportBox::new(config.render.width, config.render.height),
        );
        let scene = TreeScene {
            generations: &tree.generations,
            connectors: &tree.connectors,
            geometry: &rows,
            width: rows.width(),
            height: rows.height(),
            presentation: None,
        };
        let svg = render_svg(&scene, &config.theme, &config);
        assert!(svg.contains("<svg"));
        assert!(svg.contains("William Johnson"));
        assert!(svg.contains("data-kind=\"spouse\""));
        assert!(svg.contains("stroke-dasharray=\"6 4\""));
        assert!(svg.contains("GREAT GRANDFATHER"));
    }

    #[test]
    fn presentation_dims_other_rows() {
        let members = crate::demo::demo_members();
        let config = Config::default();
        let (tree, rows) = compute_static_tree(
            &members,
            &config.layout,
            &config.router,
            ViewportBox::new(config.render.width, config.render.height),
        );
        let mut nav = Navigator::new(tree.generations.keys.clone(), config.presentation.clone());
        assert_eq!(nav.mode(), ViewMode::Presentation);
        nav.refit(&rows);
        let active = nav.current_generation().unwrap();
        let scene = TreeScene {
            generations: &tree.generations,
            connectors: &tree.connectors,
            geometry: &rows,
            width: rows.width(),
            height: rows.height(),
            presentation: Some((active, nav.state())),
        };
        let svg = render_svg(&scene, &config.theme, &config);
        assert!(svg.contains(&format!("<g id=\"gen-row-{active}\" opacity=\"1\">")));
        assert!(svg.contains("opacity=\"0.1\""));
        assert!(svg.contains("scale("));
    }

    #[test]
    fn escapes_names() {
        let mut member = Member::new(1, "Tom & <Jerry>", 0);
        member.relation = "Cat's friend".to_string();
        let svg = member_card_svg(
            &member,
            &BoundingBox::new(0.0, 0.0, 192.0, 156.0),
            &Theme::ancestry_default(),
            &Config::default(),
        );
        assert!(svg.contains("Tom &amp; &lt;Jerry&gt;"));
        assert!(svg.contains("CAT&apos;S FRIEND"));
        assert!(!svg.contains("clipPath"));
    }

    #[test]
    fn avatar_image_is_clipped_to_a_circle() {
        let mut member = Member::new(7, "Ada", 0);
        member.image_url = Some("https://example.com/a.png".to_string());
        let svg = member_card_svg(
            &member,
            &BoundingBox::new(0.0, 0.0, 192.0, 156.0),
            &Theme::ancestry_default(),
            &Config::default(),
        );
        assert!(svg.contains("<clipPath id=\"avatar-clip-7\"><circle cx=\"96.00\" cy=\"48.00\" r=\"48.00\"/></clipPath>"));
        assert!(svg.contains("clip-path=\"url(#avatar-clip-7)\""));
        assert!(!svg.contains("circle(48"));
    }
}
