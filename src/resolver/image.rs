use crate::model::{DesignImageConfig, DesignImages, FrameDesigns, Machine, Selection};
use crate::normalizer::{is_no_frame, normalize_color_key};

/// A design config found for a variant, with normalized colour keys.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatch<'a> {
    pub frame_color: String,
    pub insert_color: String,
    pub config: &'a DesignImageConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    ExactDesign,
    FrameDesign,
    Plain,
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImage {
    pub src: String,
    pub source: ImageSource,
    /// Gallery folder of the design config, when it overrides the variant's.
    pub gallery_folder: Option<String>,
    /// The selected frame colour exists on the variant but has no usable image.
    pub dead_end: bool,
}

impl ResolvedImage {
    pub fn uses_design(&self) -> bool {
        matches!(self.source, ImageSource::ExactDesign | ImageSource::FrameDesign)
    }
}

/// Resolves a stored image path against the backend origin.
pub fn norm_src(src: &str, backend_base: &str) -> String {
    let src = src.trim();
    if src.is_empty() {
        return String::new();
    }
    let lower = src.to_ascii_lowercase();
    if lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("//")
        || lower.starts_with("data:")
    {
        return src.to_string();
    }
    let base = backend_base.trim_end_matches('/');
    if src.starts_with('/') {
        format!("{base}{src}")
    } else {
        format!("{base}/{src}")
    }
}

pub fn find_frame<'a>(designs: &'a DesignImages, frame_color: &str) -> Option<&'a FrameDesigns> {
    let target = normalize_color_key(frame_color);
    if target.is_empty() {
        return None;
    }
    designs
        .frames
        .iter()
        .find(|f| normalize_color_key(&f.frame_color) == target)
}

fn first_present(frame: &FrameDesigns) -> Option<DesignMatch<'_>> {
    frame
        .inserts
        .iter()
        .find(|(_, cfg)| cfg.is_present())
        .map(|(insert, cfg)| DesignMatch {
            frame_color: normalize_color_key(&frame.frame_color),
            insert_color: normalize_color_key(insert),
            config: cfg,
        })
}

/// Config for the exact (frame colour, insert colour) pair.
pub fn design_config<'a>(
    v: &'a Machine,
    frame_color: &str,
    insert_color: &str,
) -> Option<DesignMatch<'a>> {
    let frame = find_frame(v.designs()?, frame_color)?;
    let insert = normalize_color_key(insert_color);
    if insert.is_empty() {
        return None;
    }
    frame
        .inserts
        .iter()
        .find(|(key, cfg)| normalize_color_key(key) == insert && cfg.is_present())
        .map(|(key, cfg)| DesignMatch {
            frame_color: normalize_color_key(&frame.frame_color),
            insert_color: normalize_color_key(key),
            config: cfg,
        })
}

/// First usable insert under the given frame colour.
pub fn design_for_frame<'a>(designs: &'a DesignImages, frame_color: &str) -> Option<DesignMatch<'a>> {
    find_frame(designs, frame_color).and_then(first_present)
}

/// First usable config anywhere in the variant.
pub fn first_design(designs: &DesignImages) -> Option<DesignMatch<'_>> {
    designs.frames.iter().find_map(first_present)
}

pub fn has_design_for_selection(v: &Machine, frame_color: &str, insert_color: &str) -> bool {
    design_config(v, frame_color, insert_color).is_some()
}

pub fn has_any_design_for_frame(v: &Machine, frame_color: &str) -> bool {
    v.designs()
        .and_then(|d| design_for_frame(d, frame_color))
        .is_some()
}

fn plain_image(v: &Machine) -> Option<&str> {
    v.main_image
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| v.gallery_files.first().map(String::as_str))
}

/// Picks the image for a variant under the current frame/colour selection.
pub fn resolve_image(v: &Machine, selection: &Selection, backend_base: &str) -> ResolvedImage {
    let frame_color = normalize_color_key(&selection.frame_color);
    let insert_color = normalize_color_key(&selection.insert_color);

    if !is_no_frame(&selection.frame) && !frame_color.is_empty() && !insert_color.is_empty() {
        if let Some(designs) = v.designs() {
            let found = design_config(v, &frame_color, &insert_color)
                .map(|m| (m, ImageSource::ExactDesign))
                .or_else(|| design_for_frame(designs, &frame_color).map(|m| (m, ImageSource::FrameDesign)));

            if let Some((m, source)) = found {
                if let Some(image) = m.config.image() {
                    return ResolvedImage {
                        src: norm_src(image, backend_base),
                        source,
                        gallery_folder: m.config.gallery_folder.clone().filter(|g| !g.is_empty()),
                        dead_end: false,
                    };
                }
            }

            let dead_end = find_frame(designs, &frame_color).is_some();
            return ResolvedImage {
                dead_end,
                ..plain(v, backend_base)
            };
        }
    }

    plain(v, backend_base)
}

fn plain(v: &Machine, backend_base: &str) -> ResolvedImage {
    match plain_image(v) {
        Some(image) => ResolvedImage {
            src: norm_src(image, backend_base),
            source: ImageSource::Plain,
            gallery_folder: None,
            dead_end: false,
        },
        None => ResolvedImage {
            src: String::new(),
            source: ImageSource::Empty,
            gallery_folder: None,
            dead_end: false,
        },
    }
}

/// Gallery images with the main image first.
pub fn gallery_images(v: &Machine, backend_base: &str) -> Vec<String> {
    let mut images: Vec<String> = v
        .gallery_files
        .iter()
        .map(|f| norm_src(f, backend_base))
        .filter(|s| !s.is_empty())
        .collect();
    if let Some(main) = plain_image(v).map(|m| norm_src(m, backend_base)) {
        if !main.is_empty() && !images.contains(&main) {
            images.insert(0, main);
        }
    }
    images
}

/// Every image a variant may show: main image plus all design images.
pub fn variant_image_urls(v: &Machine, backend_base: &str) -> Vec<String> {
    let mut urls = Vec::new();
    if let Some(main) = v.main_image.as_deref().filter(|s| !s.is_empty()) {
        urls.push(norm_src(main, backend_base));
    }
    if let Some(designs) = v.designs() {
        for frame in &designs.frames {
            for (_, cfg) in &frame.inserts {
                if let Some(image) = cfg.image() {
                    let url = norm_src(image, backend_base);
                    if !urls.contains(&url) {
                        urls.push(url);
                    }
                }
            }
        }
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://backend.example";

    fn cfg(image: &str) -> DesignImageConfig {
        DesignImageConfig {
            main_image: Some(image.to_string()),
            ..Default::default()
        }
    }

    fn variant() -> Machine {
        Machine {
            id: 1,
            name: "Rio".into(),
            frame: Some("X".into()),
            main_image: Some("plain.png".into()),
            design_images: Some(DesignImages::default().insert("black", "blue", cfg("a.png"))),
            ..Default::default()
        }
    }

    fn selection(frame_color: &str, insert: &str) -> Selection {
        Selection {
            machine: "Rio".into(),
            frame: "X".into(),
            frame_color: frame_color.into(),
            insert_color: insert.into(),
            ..Default::default()
        }
    }

    #[test]
    fn norm_src_joins_relative_paths() {
        assert_eq!(norm_src("a.png", BASE), "https://backend.example/a.png");
        assert_eq!(norm_src("/media/a.png", "https://b.example/"), "https://b.example/media/a.png");
        assert_eq!(norm_src("https://cdn/x.png", BASE), "https://cdn/x.png");
        assert_eq!(norm_src("//cdn/x.png", BASE), "//cdn/x.png");
        assert_eq!(norm_src("data:image/png;base64,AA", BASE), "data:image/png;base64,AA");
        assert_eq!(norm_src("", BASE), "");
    }

    #[test]
    fn exact_design_pair_wins() {
        let resolved = resolve_image(&variant(), &selection("black", "blue"), BASE);
        assert_eq!(resolved.src, norm_src("a.png", BASE));
        assert_eq!(resolved.source, ImageSource::ExactDesign);
        assert!(!resolved.dead_end);
    }

    #[test]
    fn missing_insert_falls_back_within_frame_colour() {
        let resolved = resolve_image(&variant(), &selection("black", "red"), BASE);
        assert_eq!(resolved.src, norm_src("a.png", BASE));
        assert_eq!(resolved.source, ImageSource::FrameDesign);
    }

    #[test]
    fn localized_selection_matches_english_keys() {
        let resolved = resolve_image(&variant(), &selection("Чёрный", "синий"), BASE);
        assert_eq!(resolved.source, ImageSource::ExactDesign);
    }

    #[test]
    fn unknown_frame_colour_uses_plain_image() {
        let resolved = resolve_image(&variant(), &selection("white", "blue"), BASE);
        assert_eq!(resolved.src, norm_src("plain.png", BASE));
        assert_eq!(resolved.source, ImageSource::Plain);
        assert!(!resolved.dead_end);
    }

    #[test]
    fn empty_frame_entry_is_a_dead_end() {
        let mut v = variant();
        v.design_images = Some(
            DesignImages::default()
                .insert("black", "blue", DesignImageConfig::default())
                .insert("white", "red", cfg("w.png")),
        );
        let resolved = resolve_image(&v, &selection("black", "blue"), BASE);
        assert!(resolved.dead_end);
        assert_eq!(resolved.source, ImageSource::Plain);
    }

    #[test]
    fn no_frame_ignores_design_images() {
        let mut sel = selection("black", "blue");
        sel.frame = "нет".into();
        let resolved = resolve_image(&variant(), &sel, BASE);
        assert_eq!(resolved.source, ImageSource::Plain);
    }

    #[test]
    fn design_gallery_folder_overrides() {
        let mut v = variant();
        v.design_images = Some(DesignImages::default().insert(
            "black",
            "blue",
            DesignImageConfig {
                main_image_path: Some("/p.webp".into()),
                gallery_folder: Some("/gallery/black-blue".into()),
                ..Default::default()
            },
        ));
        let resolved = resolve_image(&v, &selection("black", "blue"), BASE);
        assert_eq!(resolved.src, "https://backend.example/p.webp");
        assert_eq!(resolved.gallery_folder.as_deref(), Some("/gallery/black-blue"));
    }

    #[test]
    fn gallery_puts_main_image_first_once() {
        let mut v = variant();
        v.gallery_files = vec!["g1.png".into(), "plain.png".into()];
        let images = gallery_images(&v, BASE);
        assert_eq!(
            images,
            vec![norm_src("g1.png", BASE), norm_src("plain.png", BASE)]
        );
        v.main_image = Some("main.png".into());
        assert_eq!(gallery_images(&v, BASE)[0], norm_src("main.png", BASE));
    }

    #[test]
    fn image_urls_include_design_images() {
        let urls = variant_image_urls(&variant(), BASE);
        assert_eq!(urls, vec![norm_src("plain.png", BASE), norm_src("a.png", BASE)]);
    }

    #[test]
    fn first_design_skips_empty_configs() {
        let designs = DesignImages::default()
            .insert("white", "red", DesignImageConfig::default())
            .insert("Чёрный", "Синий", cfg("b.png"));
        let found = first_design(&designs).unwrap();
        assert_eq!(found.frame_color, "black");
        assert_eq!(found.insert_color, "blue");
    }
}
