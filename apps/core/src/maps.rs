use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::colors::{self, Palette};
use crate::domain::{Capital, Cidade, EstadoResumo};
use crate::error::WidgetCreationError;
use crate::format::{format_currency, format_currency_mil, format_days, format_number};

pub const MAP_NACIONAL: &str = "map-brasil";
pub const MAP_IMPACTO: &str = "map-analise-impacto";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lon: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: u8,
}

pub const BRAZIL_VIEW: MapView = MapView {
    center: LatLng::new(-14.235, -51.9253),
    zoom: 4,
};

/// State capitals, used when the backend's capital list is unavailable.
pub const UF_COORDINATES: [(&str, LatLng); 27] = [
    ("AC", LatLng::new(-9.97499, -67.82435)),
    ("AL", LatLng::new(-9.57131, -36.78195)),
    ("AP", LatLng::new(0.03493, -51.06944)),
    ("AM", LatLng::new(-3.11903, -60.02173)),
    ("BA", LatLng::new(-12.97111, -38.51083)),
    ("CE", LatLng::new(-3.71722, -38.54333)),
    ("DF", LatLng::new(-15.77972, -47.92972)),
    ("ES", LatLng::new(-20.31944, -40.33778)),
    ("GO", LatLng::new(-16.67861, -49.25389)),
    ("MA", LatLng::new(-2.52972, -44.30278)),
    ("MT", LatLng::new(-15.60111, -56.0975)),
    ("MS", LatLng::new(-20.44278, -54.64639)),
    ("MG", LatLng::new(-19.91667, -43.93444)),
    ("PA", LatLng::new(-1.45583, -48.50444)),
    ("PB", LatLng::new(-7.115, -34.86306)),
    ("PR", LatLng::new(-25.42778, -49.27306)),
    ("PE", LatLng::new(-8.05389, -34.88111)),
    ("PI", LatLng::new(-5.08917, -42.80194)),
    ("RJ", LatLng::new(-22.90694, -43.17278)),
    ("RN", LatLng::new(-5.795, -35.20944)),
    ("RS", LatLng::new(-30.03306, -51.23)),
    ("RO", LatLng::new(-8.76194, -63.90389)),
    ("RR", LatLng::new(2.81972, -60.67333)),
    ("SC", LatLng::new(-27.59667, -48.54917)),
    ("SP", LatLng::new(-23.55052, -46.63331)),
    ("SE", LatLng::new(-10.91111, -37.07167)),
    ("TO", LatLng::new(-10.18417, -48.33389)),
];

pub fn uf_coordinates(uf: &str) -> Option<LatLng> {
    let uf = uf.trim().to_uppercase();
    UF_COORDINATES
        .iter()
        .find(|(code, _)| *code == uf)
        .map(|(_, at)| *at)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    pub color: String,
    pub fill_color: String,
    pub fill_opacity: f64,
    pub weight: u32,
}

impl ShapeStyle {
    fn for_region(uf: &str, fill_opacity: f64, weight: u32) -> Self {
        let hex = colors::base_hex(uf, Palette::Uf);
        Self {
            color: hex.to_string(),
            fill_color: hex.to_string(),
            fill_opacity,
            weight,
        }
    }

    pub fn default_for(uf: &str) -> Self {
        Self::for_region(uf, 0.7, 2)
    }

    pub fn highlighted(uf: &str) -> Self {
        Self::for_region(uf, 1.0, 4)
    }

    pub fn dimmed(uf: &str) -> Self {
        Self::for_region(uf, 0.3, 2)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleSpec {
    pub center: LatLng,
    pub radius: f64,
    pub style: ShapeStyle,
}

pub trait MapHandle {
    fn add_circle(&mut self, key: &str, circle: &CircleSpec);

    /// Text marker, used for city names.
    fn add_label(&mut self, key: &str, at: LatLng, text: &str);

    fn remove_shape(&mut self, key: &str);

    fn set_style(&mut self, key: &str, style: &ShapeStyle);

    fn bind_popup(&mut self, key: &str, html: &str);

    /// The backend must not hold a borrow of this handle while `on_click` runs.
    fn on_click(&mut self, key: &str, on_click: Rc<dyn Fn()>);

    fn fit_bounds(&mut self, points: &[LatLng]);

    fn remove(&mut self);
}

pub type MapRef = Rc<RefCell<dyn MapHandle>>;

pub trait MapBackend {
    fn is_available(&self) -> bool {
        true
    }

    fn create(&self, container: &str, view: &MapView) -> Result<MapRef, WidgetCreationError>;

    /// Draws a short message in place of the map.
    fn show_error(&self, container: &str, message: &str);
}

/// Called with the UF of a clicked bubble.
pub type RegionClick = Rc<dyn Fn(&str)>;

fn magnitude(value: f64, max: f64) -> f64 {
    if max > 0.0 && value.is_finite() {
        (value / max).max(0.0)
    } else {
        0.0
    }
}

/// National map: 8 to 40 px.
pub fn national_radius(value: f64, max: f64) -> f64 {
    magnitude(value, max).mul_add(32.0, 8.0).clamp(8.0, 40.0)
}

/// Impact map: 8 to 50 px.
pub fn impact_radius(value: f64, max: f64) -> f64 {
    magnitude(value, max).mul_add(42.0, 8.0).clamp(8.0, 50.0)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn max_of(values: impl Iterator<Item = f64>) -> f64 {
    values.filter(|value| value.is_finite()).fold(1.0, f64::max)
}

/// One map with a bubble per UF.
pub struct RegionOverlay {
    handle: MapRef,
    regions: Vec<String>,
    cities: RefCell<Vec<String>>,
}

impl RegionOverlay {
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    /// Highlights `selected` and dims every other region; `None` restores all.
    pub fn apply_selection(&self, selected: Option<&str>) {
        let selected = selected.map(|uf| uf.trim().to_uppercase());
        let mut handle = self.handle.borrow_mut();
        for uf in &self.regions {
            let style = match selected.as_deref() {
                Some(active) if active == uf => ShapeStyle::highlighted(uf),
                Some(_) => ShapeStyle::dimmed(uf),
                None => ShapeStyle::default_for(uf),
            };
            handle.set_style(uf, &style);
        }
    }

    fn clear_cities(&self) {
        let mut handle = self.handle.borrow_mut();
        for key in self.cities.borrow_mut().drain(..) {
            handle.remove_shape(&key);
        }
    }
}

/// Owns the live maps, keyed by container id.
pub struct MapsController {
    backend: Rc<dyn MapBackend>,
    overlays: RefCell<HashMap<String, Rc<RegionOverlay>>>,
}

impl MapsController {
    pub fn new(backend: Rc<dyn MapBackend>) -> Self {
        Self {
            backend,
            overlays: RefCell::new(HashMap::new()),
        }
    }

    fn create(&self, container: &str) -> Result<MapRef, WidgetCreationError> {
        self.destroy(container);
        if !self.backend.is_available() {
            return Err(WidgetCreationError::BackendUnavailable(
                "map library not loaded".to_string(),
            ));
        }
        self.backend.create(container, &BRAZIL_VIEW)
    }

    fn bind(handle: &MapRef, uf: &str, on_click: &RegionClick) {
        let on_click = Rc::clone(on_click);
        let key = uf.to_string();
        handle
            .borrow_mut()
            .on_click(uf, Rc::new(move || on_click(&key)));
    }

    /// Bubble per state sized by total impact.
    pub fn render_national(
        &self,
        estados: &[EstadoResumo],
        selected: Option<&str>,
        on_click: &RegionClick,
    ) -> Result<Rc<RegionOverlay>, WidgetCreationError> {
        let handle = self.create(MAP_NACIONAL)?;
        let max = max_of(estados.iter().map(|estado| estado.impacto_total));

        let mut regions = Vec::new();
        for estado in estados {
            let uf = estado.estado.trim().to_uppercase();
            let Some(center) = uf_coordinates(&uf) else {
                tracing::debug!(uf = %uf, "no coordinates for region");
                continue;
            };
            let circle = CircleSpec {
                center,
                radius: national_radius(estado.impacto_total, max),
                style: ShapeStyle::default_for(&uf),
            };
            let popup = format!(
                "<strong>{uf}</strong><br>Impacto: {}<br>Quantidade: {}",
                format_currency_mil(estado.impacto_total),
                format_number(estado.quantidade)
            );
            {
                let mut map = handle.borrow_mut();
                map.add_circle(&uf, &circle);
                map.bind_popup(&uf, &popup);
            }
            Self::bind(&handle, &uf, on_click);
            regions.push(uf);
        }

        Ok(self.register(MAP_NACIONAL, handle, regions, selected))
    }

    /// Bubble per state capital sized by total impact. Without capitals the
    /// built-in coordinates are used.
    pub fn render_impact(
        &self,
        estados: &[EstadoResumo],
        capitais: &[Capital],
        selected: Option<&str>,
        on_click: &RegionClick,
    ) -> Result<Rc<RegionOverlay>, WidgetCreationError> {
        let handle = self.create(MAP_IMPACTO)?;
        let max = max_of(estados.iter().map(|estado| estado.impacto_total));

        let mut regions = Vec::new();
        for estado in estados {
            let uf = estado.estado.trim().to_uppercase();
            let capital = capitais
                .iter()
                .find(|capital| capital.uf.trim().eq_ignore_ascii_case(&uf));
            let (center, title) = match capital {
                Some(capital) => (
                    LatLng::new(capital.lat, capital.lon),
                    format!("{uf} - {}", escape_html(&capital.capital)),
                ),
                None => match uf_coordinates(&uf) {
                    Some(center) => (center, uf.clone()),
                    None => continue,
                },
            };

            let circle = CircleSpec {
                center,
                radius: impact_radius(estado.impacto_total, max),
                style: ShapeStyle::default_for(&uf),
            };
            let popup = format!(
                "<strong>{title}</strong><br>Quantidade: {}<br>\
                 Erro Sistêmico: {}<br>Tempo Médio: {}",
                format_number(estado.quantidade),
                format_currency_mil(estado.impacto_total),
                format_days(estado.tempo_medio)
            );
            {
                let mut map = handle.borrow_mut();
                map.add_circle(&uf, &circle);
                map.bind_popup(&uf, &popup);
            }
            Self::bind(&handle, &uf, on_click);
            regions.push(uf);
        }

        Ok(self.register(MAP_IMPACTO, handle, regions, selected))
    }

    fn register(
        &self,
        container: &str,
        handle: MapRef,
        regions: Vec<String>,
        selected: Option<&str>,
    ) -> Rc<RegionOverlay> {
        let overlay = Rc::new(RegionOverlay {
            handle,
            regions,
            cities: RefCell::new(Vec::new()),
        });
        overlay.apply_selection(selected);
        self.overlays
            .borrow_mut()
            .insert(container.to_string(), Rc::clone(&overlay));
        overlay
    }

    /// Replaces the city labels of `container` and zooms to them.
    pub fn show_cities(&self, container: &str, cidades: &[Cidade]) -> bool {
        let Some(overlay) = self.overlay(container) else {
            return false;
        };
        overlay.clear_cities();
        if cidades.is_empty() {
            return false;
        }

        let mut points = Vec::with_capacity(cidades.len());
        {
            let mut handle = overlay.handle.borrow_mut();
            let mut keys = overlay.cities.borrow_mut();
            for cidade in cidades {
                let key = format!("cidade:{}", cidade.cidade);
                let at = LatLng::new(cidade.lat, cidade.lon);
                handle.add_label(&key, at, &cidade.cidade);
                handle.bind_popup(
                    &key,
                    &format!(
                        "<strong>{}</strong><br>Qtd: {}<br>Impacto: {}",
                        escape_html(&cidade.cidade),
                        format_number(cidade.quantidade),
                        format_currency(cidade.impacto_total)
                    ),
                );
                keys.push(key);
                points.push(at);
            }
            handle.fit_bounds(&points);
        }
        true
    }

    /// Restyles every live map for the current UF selection.
    pub fn apply_selection(&self, selected: Option<&str>) {
        let overlays: Vec<Rc<RegionOverlay>> = self.overlays.borrow().values().cloned().collect();
        for overlay in overlays {
            overlay.apply_selection(selected);
        }
    }

    pub fn overlay(&self, container: &str) -> Option<Rc<RegionOverlay>> {
        self.overlays.borrow().get(container).cloned()
    }

    pub fn destroy(&self, container: &str) {
        let overlay = self.overlays.borrow_mut().remove(container);
        if let Some(overlay) = overlay {
            overlay.handle.borrow_mut().remove();
        }
    }

    /// Replaces the map with a short message.
    pub fn show_error(&self, container: &str, message: &str) {
        self.destroy(container);
        self.backend.show_error(container, message);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::RecordingMapBackend;

    fn estados() -> Vec<EstadoResumo> {
        vec![
            EstadoResumo {
                estado: "SP".to_string(),
                quantidade: 100.0,
                impacto_total: 200_000.0,
                tempo_medio: 120.0,
            },
            EstadoResumo {
                estado: "RJ".to_string(),
                quantidade: 50.0,
                impacto_total: 100_000.0,
                tempo_medio: 90.5,
            },
            EstadoResumo {
                estado: "XX".to_string(),
                quantidade: 1.0,
                impacto_total: 1.0,
                tempo_medio: 0.0,
            },
        ]
    }

    fn ignore_clicks() -> RegionClick {
        Rc::new(|_: &str| {})
    }

    #[test]
    fn radius_scales_with_magnitude_and_is_clamped() {
        assert_eq!(national_radius(0.0, 100.0), 8.0);
        assert_eq!(national_radius(100.0, 100.0), 40.0);
        assert_eq!(national_radius(50.0, 100.0), 24.0);
        assert_eq!(impact_radius(100.0, 100.0), 50.0);
        assert_eq!(impact_radius(f64::NAN, 100.0), 8.0);
    }

    #[test]
    fn national_map_skips_unknown_regions_and_formats_popups() {
        let backend = Rc::new(RecordingMapBackend::default());
        let maps = MapsController::new(backend.clone());

        let overlay = maps
            .render_national(&estados(), None, &ignore_clicks())
            .unwrap();

        assert_eq!(overlay.regions(), ["SP", "RJ"]);
        assert_eq!(backend.radius(MAP_NACIONAL, "SP"), Some(40.0));
        assert_eq!(backend.radius(MAP_NACIONAL, "RJ"), Some(24.0));
        assert_eq!(
            backend.popup(MAP_NACIONAL, "SP").as_deref(),
            Some("<strong>SP</strong><br>Impacto: R$ 200 Mil<br>Quantidade: 100")
        );
    }

    #[test]
    fn selection_highlights_one_and_dims_the_rest() {
        let backend = Rc::new(RecordingMapBackend::default());
        let maps = MapsController::new(backend.clone());
        maps.render_impact(&estados(), &[], None, &ignore_clicks())
            .unwrap();

        maps.apply_selection(Some("sp"));
        assert_eq!(
            backend.style(MAP_IMPACTO, "SP"),
            Some(ShapeStyle::highlighted("SP"))
        );
        assert_eq!(
            backend.style(MAP_IMPACTO, "RJ"),
            Some(ShapeStyle::dimmed("RJ"))
        );

        maps.apply_selection(None);
        assert_eq!(
            backend.style(MAP_IMPACTO, "RJ"),
            Some(ShapeStyle::default_for("RJ"))
        );
        assert_eq!(
            backend.style(MAP_IMPACTO, "SP").map(|style| style.fill_color),
            Some(colors::base_hex("SP", Palette::Uf).to_string())
        );
    }

    #[test]
    fn clicks_report_the_region() {
        let backend = Rc::new(RecordingMapBackend::default());
        let maps = MapsController::new(backend.clone());
        let clicked = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&clicked);
        let on_click: RegionClick = Rc::new(move |uf: &str| sink.borrow_mut().push(uf.to_string()));

        maps.render_impact(
            &estados(),
            &[Capital {
                uf: "RJ".to_string(),
                capital: "Rio de Janeiro".to_string(),
                lat: -22.9,
                lon: -43.2,
            }],
            None,
            &on_click,
        )
        .unwrap();
        backend.click(MAP_IMPACTO, "RJ");

        assert_eq!(*clicked.borrow(), vec!["RJ"]);
        assert!(backend
            .popup(MAP_IMPACTO, "RJ")
            .is_some_and(|popup| popup.starts_with("<strong>RJ - Rio de Janeiro</strong>")));
    }

    #[test]
    fn rerender_removes_the_previous_map() {
        let backend = Rc::new(RecordingMapBackend::default());
        let maps = MapsController::new(backend.clone());

        maps.render_national(&estados(), None, &ignore_clicks())
            .unwrap();
        maps.render_national(&estados(), None, &ignore_clicks())
            .unwrap();

        assert_eq!(backend.created(MAP_NACIONAL), 2);
        assert_eq!(backend.removed(MAP_NACIONAL), 1);
    }

    #[test]
    fn error_replaces_the_live_map() {
        let backend = Rc::new(RecordingMapBackend::default());
        let maps = MapsController::new(backend.clone());
        maps.render_national(&estados(), None, &ignore_clicks())
            .unwrap();

        maps.show_error(MAP_NACIONAL, "Erro: backend não respondeu");

        assert_eq!(backend.removed(MAP_NACIONAL), 1);
        assert!(maps.overlay(MAP_NACIONAL).is_none());
        assert_eq!(
            backend.errors(),
            vec![(
                MAP_NACIONAL.to_string(),
                "Erro: backend não respondeu".to_string()
            )]
        );
    }

    #[test]
    fn cities_replace_previous_labels() {
        let backend = Rc::new(RecordingMapBackend::default());
        let maps = MapsController::new(backend.clone());
        maps.render_impact(&estados(), &[], None, &ignore_clicks())
            .unwrap();
        let city = |name: &str| Cidade {
            cidade: name.to_string(),
            quantidade: 3.0,
            impacto_total: 10.0,
            lat: -23.0,
            lon: -46.0,
        };

        assert!(maps.show_cities(MAP_IMPACTO, &[city("Santos"), city("Campinas")]));
        assert!(maps.show_cities(MAP_IMPACTO, &[city("Niterói")]));

        assert_eq!(backend.labels(MAP_IMPACTO), vec!["Niterói"]);
        assert!(!maps.show_cities("nowhere", &[city("Santos")]));
    }
}
