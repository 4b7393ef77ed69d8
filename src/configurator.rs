// Configurator session: selects, cascade, variant resolution and the view model
use crate::catalog::{Catalog, SpecIndex};
use crate::client::images::ImageLoadSequencer;
use crate::client::traits::CatalogApi;
use crate::model::{ConfigData, Field, LeadError, LeadRequest, LeadSelection, Machine, Selection, Spec, SpecCategory};
use crate::normalizer::norm_val;
use crate::resolver::availability::CascadeOutcome;
use crate::resolver::image::{ResolvedImage, gallery_images, resolve_image};
use crate::resolver::selects::{FRIDGE_PLACEHOLDER, SelectBoard};
use crate::resolver::variant::{ExclusionSet, find_variant};
use crate::storage::{LocalStore, SelectionStore};
use crate::utils::fmt_price;
use tracing::{debug, info, warn};

pub const OZON_BUY_LABEL: &str = "Купить на OZON";
pub const OZON_MISSING_LABEL: &str = "Нет на OZON";

#[derive(Debug, Clone, PartialEq)]
pub struct OzonButton {
    pub enabled: bool,
    pub href: String,
    pub label: &'static str,
}

impl OzonButton {
    fn for_variant(v: Option<&Machine>) -> Self {
        match v.and_then(|v| v.ozon_link.as_deref()).filter(|l| !l.trim().is_empty()) {
            Some(link) => Self {
                enabled: true,
                href: link.to_string(),
                label: OZON_BUY_LABEL,
            },
            None => Self {
                enabled: false,
                href: "#".to_string(),
                label: OZON_MISSING_LABEL,
            },
        }
    }
}

/// One characteristics block; `None` in `SpecBlocks` renders as "—".
#[derive(Debug, Clone, PartialEq)]
pub struct SpecBlock {
    pub name: String,
    pub lines: Vec<String>,
}

impl SpecBlock {
    fn from_spec(spec: Option<&Spec>) -> Option<Self> {
        let spec = spec?;
        let lines = spec.lines();
        if lines.is_empty() {
            return None;
        }
        Some(Self {
            name: spec.name.clone(),
            lines,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecBlocks {
    pub machine: Option<SpecBlock>,
    pub frame: Option<SpecBlock>,
    pub fridge: Option<SpecBlock>,
    pub terminal: Option<SpecBlock>,
}

/// Everything the page shows for the current variant.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantView {
    pub variant_id: Option<i64>,
    pub price_text: String,
    /// Source of the main image; empty when there is nothing to show.
    pub main_image: String,
    pub image: Option<ResolvedImage>,
    pub images: Vec<String>,
    pub image_index: usize,
    pub nav_visible: bool,
    pub gallery_folder: Option<String>,
    pub with_frame: bool,
    pub ozon: OzonButton,
    pub specs: SpecBlocks,
    pub load_ticket: u64,
}

/// Contents of the quote request form.
#[derive(Debug, Clone, Default)]
pub struct LeadForm {
    pub name: String,
    pub phone: String,
    pub telegram: String,
    pub email: String,
    pub consent: bool,
}

impl LeadForm {
    pub fn validate(&self) -> Result<(), LeadError> {
        if self.name.trim().is_empty() {
            return Err(LeadError::MissingName);
        }
        if self.phone.trim().is_empty() {
            return Err(LeadError::MissingPhone);
        }
        if !self.consent {
            return Err(LeadError::MissingConsent);
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

fn has_frame(frame: &str) -> bool {
    let frame = norm_val(frame);
    !frame.is_empty() && frame != "нет"
}

/// One configurator session over an immutable catalog.
pub struct Configurator {
    catalog: Catalog,
    backend_base: String,
    selects: SelectBoard,
    excluded: ExclusionSet,
    current: Option<i64>,
    images: Vec<String>,
    nav_enabled: bool,
    image_index: usize,
    loads: ImageLoadSequencer,
}

impl Configurator {
    pub fn new(data: &ConfigData, backend_base: &str) -> Self {
        let catalog = Catalog::from_data(data);
        let selects = SelectBoard::populate(&catalog.machines);
        let mut configurator = Self {
            catalog,
            backend_base: backend_base.trim_end_matches('/').to_string(),
            selects,
            excluded: ExclusionSet::default(),
            current: None,
            images: Vec::new(),
            nav_enabled: false,
            image_index: 0,
            loads: ImageLoadSequencer::new(),
        };
        configurator.fill_selects();
        configurator
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn specs(&self) -> &SpecIndex {
        &self.catalog.specs
    }

    pub fn selects(&self) -> &SelectBoard {
        &self.selects
    }

    pub fn excluded(&self) -> &ExclusionSet {
        &self.excluded
    }

    pub fn selection(&self) -> Selection {
        self.selects.selection()
    }

    pub fn current(&self) -> Option<&Machine> {
        self.current.and_then(|id| self.catalog.machine(id))
    }

    pub fn image_loads(&self) -> &ImageLoadSequencer {
        &self.loads
    }

    fn fill_selects(&mut self) {
        self.ensure_machine_selection();
        self.ensure_fridge_selection();
        self.update_frame_color_state();
        self.update_insert_color_state();
    }

    /// Initial render: restores `saved` and picks a variant, falling back to
    /// the first catalog row.
    pub fn start(&mut self, saved: Option<&Selection>) -> VariantView {
        if let Some(saved) = saved {
            self.selects.apply(saved);
        }
        self.ensure_machine_selection();
        self.update_available_options(None);
        self.ensure_fridge_selection();
        self.update_frame_color_state();
        self.update_insert_color_state();
        self.update_terminal_state();

        let selection = self.selects.selection();
        let found = find_variant(&self.catalog, &self.excluded, &selection, true).map(|v| v.id);
        match found {
            Some(id) => self.render(Some(id), false),
            None => {
                let first = self.catalog.machines.first().map(|v| v.id);
                self.render(first, true)
            }
        }
    }

    /// Swaps in a refreshed catalog, keeping the current selection.
    pub fn reload(&mut self, data: &ConfigData) -> VariantView {
        let selection = self.selects.selection();
        self.catalog = Catalog::from_data(data);
        self.selects = SelectBoard::populate(&self.catalog.machines);
        self.fill_selects();
        info!("🔄 Catalog reloaded, version {:?}", self.catalog.version);
        self.start(Some(&selection))
    }

    /// A select changed: cascade, re-resolve, render.
    pub fn change(&mut self, field: Field, value: &str) -> VariantView {
        self.selects.set(field, value);
        debug!("Select {:?} changed to {:?}", field, self.selects.value(field));
        self.update_available_options(Some(field));
        self.ensure_machine_selection();
        self.ensure_fridge_selection();
        self.update_frame_color_state();
        self.update_insert_color_state();

        let selection = self.selects.selection();
        let id = find_variant(&self.catalog, &self.excluded, &selection, true).map(|v| v.id);
        self.render(id, false)
    }

    /// Shows a specific variant and synchronizes the selects to it.
    pub fn show_variant(&mut self, id: i64) -> VariantView {
        self.render(Some(id), true)
    }

    pub fn update_available_options(&mut self, pinned: Option<Field>) -> CascadeOutcome {
        self.selects.update_available_options(&self.catalog.machines, pinned)
    }

    fn ensure_machine_selection(&mut self) {
        let machine = &mut self.selects.machine;
        if machine.value.is_empty() {
            if let Some(first) = machine.first_option().map(str::to_string) {
                machine.value = first;
            }
        }
    }

    fn ensure_fridge_selection(&mut self) {
        let frame_set = !self.selects.frame.value.is_empty();
        let fridge = &mut self.selects.fridge;
        if frame_set {
            fridge.remove_placeholder();
            if fridge.value.is_empty() {
                let first = fridge.first_visible().or(fridge.first_option()).unwrap_or_default().to_string();
                fridge.value = first;
            }
        } else {
            fridge.ensure_placeholder(FRIDGE_PLACEHOLDER);
        }
    }

    fn update_frame_color_state(&mut self) {
        let enabled = has_frame(&self.selects.frame.value);
        let frame_color = &mut self.selects.frame_color;
        frame_color.disabled = !enabled;
        if !enabled {
            frame_color.value.clear();
        } else if frame_color.value.is_empty() {
            frame_color.set("black");
        }
    }

    fn update_insert_color_state(&mut self) {
        let frame = norm_val(&self.selects.frame.value);
        let enabled = !matches!(frame.as_str(), "" | "нет" | "no");
        let insert = &mut self.selects.insert_color;
        insert.disabled = !enabled;
        if !enabled {
            insert.value.clear();
        } else if insert.value.is_empty() {
            insert.set("blue");
        }
    }

    fn update_terminal_state(&mut self) {
        let enabled = !self.selects.machine.value.is_empty();
        let terminal = &mut self.selects.terminal;
        terminal.disabled = !enabled;
        if !enabled {
            terminal.value.clear();
        }
    }

    fn sync_selects(&mut self, v: &Machine) {
        self.selects.set(Field::Machine, v.display_model());
        self.selects.set(Field::Frame, v.frame.as_deref().unwrap_or_default());
        self.selects
            .set(Field::FrameColor, v.frame_color.as_deref().unwrap_or_default());
        self.selects
            .set(Field::Fridge, v.refrigerator.as_deref().unwrap_or_default());
        self.selects.set(Field::Terminal, v.terminal.as_deref().unwrap_or_default());
    }

    fn render(&mut self, id: Option<i64>, sync: bool) -> VariantView {
        self.render_variant(id, sync, false)
    }

    fn render_variant(&mut self, id: Option<i64>, sync: bool, retried: bool) -> VariantView {
        let Some(v) = id.and_then(|id| self.catalog.machine(id)).cloned() else {
            self.current = None;
            self.update_frame_color_state();
            self.update_insert_color_state();
            self.update_terminal_state();
            return self.empty_view();
        };

        if sync {
            self.sync_selects(&v);
        }
        self.update_frame_color_state();
        self.update_insert_color_state();
        self.update_terminal_state();

        let selection = self.selects.selection();
        let image = resolve_image(&v, &selection, &self.backend_base);
        debug!("🎨 Render variant {} ({}): {:?}", v.id, v.name, image.source);

        if image.dead_end {
            self.excluded.insert(v.id);
            warn!("⛔ Skipping variant {} with empty design_images for {:?}", v.id, selection.frame_color);
            if !retried {
                let alt = find_variant(&self.catalog, &self.excluded, &selection, true)
                    .map(|alt| alt.id)
                    .filter(|alt| *alt != v.id);
                if let Some(alt) = alt {
                    return self.render_variant(Some(alt), true, true);
                }
            }
        }

        if self.current != Some(v.id) {
            self.image_index = 0;
        }
        self.current = Some(v.id);

        let gallery_folder = image
            .gallery_folder
            .clone()
            .or_else(|| v.gallery_folder.clone());
        if image.uses_design() {
            self.images = vec![image.src.clone()];
            self.nav_enabled = false;
            self.image_index = 0;
        } else {
            self.images = gallery_images(&v, &self.backend_base);
            self.nav_enabled = self.images.len() > 1;
            self.image_index = self.image_index.min(self.images.len().saturating_sub(1));
        }
        let main_image = self
            .images
            .get(self.image_index)
            .cloned()
            .unwrap_or_else(|| image.src.clone());

        VariantView {
            variant_id: Some(v.id),
            price_text: fmt_price(v.price),
            main_image,
            images: self.images.clone(),
            image_index: self.image_index,
            nav_visible: self.nav_enabled,
            gallery_folder,
            with_frame: has_frame(&selection.frame),
            ozon: OzonButton::for_variant(Some(&v)),
            specs: self.spec_blocks(&v, &selection),
            load_ticket: self.loads.begin(),
            image: Some(image),
        }
    }

    fn empty_view(&mut self) -> VariantView {
        self.images.clear();
        self.nav_enabled = false;
        self.image_index = 0;
        VariantView {
            variant_id: None,
            price_text: fmt_price(None),
            main_image: String::new(),
            image: None,
            images: Vec::new(),
            image_index: 0,
            nav_visible: false,
            gallery_folder: None,
            with_frame: has_frame(&self.selects.frame.value),
            ozon: OzonButton::for_variant(None),
            specs: SpecBlocks::default(),
            load_ticket: self.loads.begin(),
        }
    }

    fn spec_blocks(&self, v: &Machine, selection: &Selection) -> SpecBlocks {
        let specs = &self.catalog.specs;
        let lookup = |category: SpecCategory, name: Option<&str>| {
            SpecBlock::from_spec(name.and_then(|n| specs.get(category, n)))
        };
        let terminal = if selection.terminal.is_empty() {
            None
        } else {
            SpecBlock::from_spec(
                specs
                    .get(SpecCategory::Terminal, &selection.terminal)
                    .or_else(|| v.terminal.as_deref().and_then(|t| specs.get(SpecCategory::Terminal, t))),
            )
        };
        SpecBlocks {
            machine: lookup(SpecCategory::CoffeeMachine, Some(v.display_model())),
            frame: lookup(SpecCategory::Frame, v.frame.as_deref()),
            fridge: lookup(SpecCategory::Refrigerator, v.refrigerator.as_deref()),
            terminal,
        }
    }

    fn step_image(&mut self, forward: bool) -> Option<(String, u64)> {
        if !self.nav_enabled || self.images.is_empty() {
            return None;
        }
        let len = self.images.len();
        self.image_index = if forward {
            (self.image_index + 1) % len
        } else {
            (self.image_index + len - 1) % len
        };
        let src = self.images[self.image_index].clone();
        Some((src, self.loads.begin()))
    }

    /// Next gallery image with its load ticket; `None` when navigation is hidden.
    pub fn next_image(&mut self) -> Option<(String, u64)> {
        self.step_image(true)
    }

    pub fn prev_image(&mut self) -> Option<(String, u64)> {
        self.step_image(false)
    }

    pub fn image_index(&self) -> usize {
        self.image_index
    }

    /// A finished image load; returns the source to display unless a newer load superseded it.
    pub fn apply_image(&self, ticket: u64, src: String) -> Option<String> {
        self.loads.complete(ticket, src)
    }

    pub fn save_selection(&self, store: &LocalStore) {
        SelectionStore::save(store, &self.selects.selection());
    }

    pub fn lead_request(&self, form: &LeadForm) -> Result<LeadRequest, LeadError> {
        form.validate()?;
        Ok(LeadRequest {
            name: form.name.trim().to_string(),
            phone: form.phone.trim().to_string(),
            telegram: form.telegram.trim().to_string(),
            email: form.email.trim().to_string(),
            selection: self.current().map(LeadSelection::from),
        })
    }

    pub async fn submit_lead<A: CatalogApi + ?Sized>(&self, api: &A, form: &LeadForm) -> Result<(), LeadError> {
        let lead = self.lead_request(form)?;
        api.submit_lead(&lead).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ApiError, DesignImageConfig, DesignImages};
    use std::sync::Mutex as StdMutex;

    const BASE: &str = "https://shop.example";

    fn cfg(image: &str) -> DesignImageConfig {
        DesignImageConfig {
            main_image: Some(image.to_string()),
            ..Default::default()
        }
    }

    fn m(id: i64, frame: &str, fridge: &str) -> Machine {
        Machine {
            id,
            name: "Rio".into(),
            model: Some("Rio".into()),
            frame: Some(frame.into()),
            refrigerator: Some(fridge.into()),
            terminal: Some("Vendotek".into()),
            price: Some(150000.0),
            design_images: Some(DesignImages::default().insert("black", "blue", cfg(&format!("{id}.png")))),
            ..Default::default()
        }
    }

    fn data(machines: Vec<Machine>) -> ConfigData {
        ConfigData {
            machines,
            specs: vec![],
            version: Some("1".into()),
        }
    }

    #[test]
    fn defaults_follow_the_frame() {
        let mut c = Configurator::new(&data(vec![m(1, "A", "X")]), BASE);
        assert_eq!(c.selects().value(Field::Machine), "Rio");
        assert!(c.selects().frame_color.disabled);
        assert_eq!(c.selects().value(Field::InsertColor), "");
        assert!(c.selects().fridge.has_placeholder());

        c.change(Field::Frame, "A");
        assert!(!c.selects().frame_color.disabled);
        assert_eq!(c.selects().value(Field::FrameColor), "black");
        assert_eq!(c.selects().value(Field::InsertColor), "blue");
        assert_eq!(c.selects().value(Field::Fridge), "X");
        assert!(!c.selects().fridge.has_placeholder());
    }

    #[test]
    fn fridge_change_cascades_to_frame() {
        let mut c = Configurator::new(&data(vec![m(1, "A", "X"), m(2, "B", "Y")]), BASE);
        c.change(Field::Frame, "A");
        let view = c.change(Field::Fridge, "Y");
        assert_eq!(c.selects().value(Field::Frame), "B");
        assert_eq!(c.selects().value(Field::Fridge), "Y");
        assert_eq!(view.variant_id, Some(2));
    }

    #[test]
    fn unavailable_frame_colour_falls_back_to_a_design() {
        let mut c = Configurator::new(&data(vec![m(1, "A", "X")]), BASE);
        c.change(Field::Frame, "A");
        let view = c.change(Field::FrameColor, "white");
        assert_eq!(c.selects().value(Field::FrameColor), "black");
        assert!(!c.selects().frame_color.current_hidden());
        assert_eq!(view.variant_id, Some(1));
    }

    #[test]
    fn frame_of_another_model_falls_back_to_a_visible_one() {
        let mut bar = m(2, "C", "X");
        bar.name = "Bar".into();
        bar.model = Some("Bar".into());
        let mut c = Configurator::new(&data(vec![m(1, "A", "X"), bar]), BASE);
        c.change(Field::Machine, "Rio");
        let view = c.change(Field::Frame, "C");
        assert_eq!(c.selects().value(Field::Machine), "Rio");
        assert_eq!(c.selects().value(Field::Frame), "A");
        assert!(!c.selects().frame.current_hidden());
        assert_eq!(view.variant_id, Some(1));
    }

    #[test]
    fn superseded_image_load_is_not_applied() {
        let mut v = m(1, "", "X");
        v.main_image = Some("m.png".into());
        v.gallery_files = vec!["g1.png".into()];
        let mut c = Configurator::new(&data(vec![v]), BASE);
        let view = c.start(None);
        let (src, ticket) = c.next_image().unwrap();

        assert_eq!(c.apply_image(view.load_ticket, view.main_image.clone()), None);
        assert_eq!(c.apply_image(ticket, src).as_deref(), Some("https://shop.example/g1.png"));
    }

    #[test]
    fn dead_end_variant_is_excluded_and_replaced() {
        let mut broken = m(1, "A", "X");
        broken.frame_color = Some("black".into());
        broken.design_images = Some(DesignImages::default().insert("black", "blue", DesignImageConfig::default()));
        let mut good = m(2, "A", "X");
        good.design_images = Some(DesignImages::default().insert("black", "blue", cfg("b.png")));
        let mut c = Configurator::new(&data(vec![broken, good]), BASE);

        let view = c.show_variant(1);
        assert!(c.excluded().contains(1));
        assert_eq!(view.variant_id, Some(2));
        assert_eq!(view.main_image, "https://shop.example/b.png");
        assert!(!view.nav_visible);
        assert_eq!(c.current().map(|v| v.id), Some(2));
    }

    #[test]
    fn dead_end_without_alternative_shows_plain_image() {
        let mut broken = m(1, "A", "X");
        broken.main_image = Some("/img/plain.png".into());
        broken.design_images = Some(DesignImages::default().insert("black", "blue", DesignImageConfig::default()));
        let mut c = Configurator::new(&data(vec![broken]), BASE);

        let view = c.show_variant(1);
        assert!(c.excluded().contains(1));
        assert_eq!(view.variant_id, Some(1));
        assert_eq!(view.main_image, "https://shop.example/img/plain.png");
    }

    #[test]
    fn gallery_navigation_wraps() {
        let mut v = m(1, "", "X");
        v.main_image = Some("m.png".into());
        v.gallery_files = vec!["g1.png".into(), "g2.png".into()];
        let mut c = Configurator::new(&data(vec![v]), BASE);
        let view = c.start(None);
        assert!(view.nav_visible);
        assert!(!view.with_frame);
        assert_eq!(view.images.len(), 3);
        assert_eq!(view.main_image, "https://shop.example/m.png");

        let first = c.loads.begin();
        let (src, ticket) = c.next_image().unwrap();
        assert_eq!(src, "https://shop.example/g1.png");
        assert!(!c.image_loads().is_current(first));
        assert!(c.image_loads().is_current(ticket));
        c.next_image();
        assert_eq!(c.next_image().unwrap().0, "https://shop.example/m.png");
        assert_eq!(c.prev_image().unwrap().0, "https://shop.example/g2.png");
        assert_eq!(c.image_index(), 2);
    }

    #[test]
    fn single_image_hides_navigation() {
        let mut v = m(1, "", "X");
        v.main_image = Some("m.png".into());
        let mut c = Configurator::new(&data(vec![v]), BASE);
        let view = c.start(None);
        assert!(!view.nav_visible);
        assert!(c.next_image().is_none());
    }

    #[test]
    fn ozon_button_and_price() {
        let mut with_link = m(1, "A", "X");
        with_link.ozon_link = Some("https://ozon.ru/p/1".into());
        let mut without = m(2, "B", "Y");
        without.price = None;
        let mut c = Configurator::new(&data(vec![with_link, without]), BASE);

        let view = c.start(None);
        assert_eq!(view.variant_id, Some(1));
        assert!(view.ozon.enabled);
        assert_eq!(view.ozon.label, OZON_BUY_LABEL);
        assert_eq!(view.price_text, "150\u{a0}000 ₽");

        let view = c.show_variant(2);
        assert!(!view.ozon.enabled);
        assert_eq!(view.ozon.href, "#");
        assert_eq!(view.ozon.label, OZON_MISSING_LABEL);
        assert_eq!(view.price_text, "—");
    }

    #[test]
    fn terminal_spec_prefers_selected_terminal() {
        let mut v = m(1, "A", "X");
        v.terminal = Some("Old".into());
        let mut other = m(2, "A", "X");
        other.terminal = Some("New".into());
        let spec = |category: &str, name: &str| Spec {
            category: category.into(),
            name: name.into(),
            specs_text: Some(format!("{name} line")),
            ..Default::default()
        };
        let mut payload = data(vec![v, other]);
        payload.specs = vec![spec("terminal", "Old"), spec("coffee_machine", "Rio")];
        let mut c = Configurator::new(&payload, BASE);

        let view = c.start(None);
        assert_eq!(view.specs.machine.as_ref().map(|b| b.name.as_str()), Some("Rio"));
        assert!(view.specs.terminal.is_none());

        let view = c.change(Field::Terminal, "New");
        assert_eq!(view.variant_id, Some(2));
        assert!(view.specs.terminal.is_none());

        let view = c.change(Field::Terminal, "Old");
        assert_eq!(view.specs.terminal.unwrap().lines, vec!["Old line"]);
        assert!(view.specs.frame.is_none());
    }

    #[test]
    fn selection_round_trips_through_a_fresh_session() {
        let store = LocalStore::open_in_memory().unwrap();
        let catalog = data(vec![m(1, "A", "X"), m(2, "B", "Y")]);

        let mut first = Configurator::new(&catalog, BASE);
        first.change(Field::Frame, "B");
        first.change(Field::InsertColor, "Фиолетовый");
        first.save_selection(&store);
        let saved = first.selection();
        assert_eq!(saved.insert_color, "purple");

        let mut second = Configurator::new(&catalog, BASE);
        let restored = SelectionStore::load(&store).unwrap();
        let view = second.start(Some(&restored));
        assert_eq!(second.selection(), saved);
        assert_eq!(view.variant_id, Some(2));
    }

    #[test]
    fn empty_catalog_renders_nothing() {
        let mut c = Configurator::new(&ConfigData::default(), BASE);
        let view = c.start(None);
        assert_eq!(view.variant_id, None);
        assert_eq!(view.price_text, "—");
        assert!(!view.ozon.enabled);
        assert!(c.selects().terminal.disabled);
    }

    #[test]
    fn lead_validation() {
        let c = Configurator::new(&data(vec![m(1, "A", "X")]), BASE);
        let mut form = LeadForm {
            phone: "+7 900 000-00-00".into(),
            consent: true,
            ..Default::default()
        };
        assert!(matches!(c.lead_request(&form), Err(LeadError::MissingName)));
        form.name = " Иван ".into();
        form.consent = false;
        assert!(matches!(c.lead_request(&form), Err(LeadError::MissingConsent)));
        form.consent = true;
        let lead = c.lead_request(&form).unwrap();
        assert_eq!(lead.name, "Иван");
        assert!(lead.selection.is_none());
    }

    struct RecordingApi {
        leads: StdMutex<Vec<LeadRequest>>,
    }

    #[async_trait::async_trait]
    impl CatalogApi for RecordingApi {
        async fn config_data(&self) -> Result<ConfigData, ApiError> {
            Err(ApiError::Timeout)
        }

        async fn coffee_machines(&self) -> Result<Vec<Machine>, ApiError> {
            Err(ApiError::Timeout)
        }

        async fn specs(&self) -> Result<Vec<Spec>, ApiError> {
            Err(ApiError::Timeout)
        }

        async fn config_version(&self) -> Result<Option<String>, ApiError> {
            Ok(None)
        }

        async fn submit_lead(&self, lead: &LeadRequest) -> Result<(), ApiError> {
            if let Ok(mut leads) = self.leads.lock() {
                leads.push(lead.clone());
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn submitted_lead_carries_the_variant() {
        let mut c = Configurator::new(&data(vec![m(7, "A", "X")]), BASE);
        c.start(None);
        let api = RecordingApi {
            leads: StdMutex::new(Vec::new()),
        };
        let form = LeadForm {
            name: "Иван".into(),
            phone: "+79000000000".into(),
            consent: true,
            ..Default::default()
        };
        c.submit_lead(&api, &form).await.unwrap();
        let leads = api.leads.lock().unwrap();
        let selection = leads[0].selection.as_ref().unwrap();
        assert_eq!(selection.id, 7);
        assert_eq!(selection.machine, "Rio");
    }
}
