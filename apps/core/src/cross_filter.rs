use std::cell::RefCell;
use std::rc::Rc;

use crate::api::ApiClient;
use crate::domain::UfShare;
use crate::error::DashboardError;
use crate::filters::{FilterKind, FilterStore};
use crate::lifecycle::ChartLifecycleManager;
use crate::maps::{MapsController, MAP_IMPACTO};
use crate::render::UpdateMode;
use crate::tables::TablesController;
use crate::view_model::DonutView;

/// Widget id of the per-UF share donut.
pub const DONUT_WIDGET: &str = "chartImpactoRosc";

/// Clicking the active key clears it; any other key replaces it.
pub fn toggle(current: Option<&str>, clicked: &str) -> Option<String> {
    let clicked = clicked.trim();
    if clicked.is_empty() || current.is_some_and(|current| current.trim() == clicked) {
        None
    } else {
        Some(clicked.to_string())
    }
}

/// Unfiltered per-UF shares for one objeto filter.
#[derive(Debug, Clone, PartialEq)]
struct Baseline {
    objeto: Option<String>,
    shares: Vec<UfShare>,
}

pub struct CrossFilterCoordinator {
    filters: Rc<FilterStore>,
    api: Rc<ApiClient>,
    charts: Rc<ChartLifecycleManager>,
    maps: Rc<MapsController>,
    tables: Rc<TablesController>,
    baseline: RefCell<Option<Baseline>>,
}

impl CrossFilterCoordinator {
    pub fn new(
        filters: Rc<FilterStore>,
        api: Rc<ApiClient>,
        charts: Rc<ChartLifecycleManager>,
        maps: Rc<MapsController>,
        tables: Rc<TablesController>,
    ) -> Self {
        Self {
            filters,
            api,
            charts,
            maps,
            tables,
            baseline: RefCell::new(None),
        }
    }

    /// Remembers the all-UF shares behind the donut so later selections only
    /// restyle it.
    pub fn cache_baseline(&self, objeto: Option<&str>, shares: Vec<UfShare>) {
        *self.baseline.borrow_mut() = Some(Baseline {
            objeto: objeto.map(str::to_string),
            shares,
        });
    }

    /// Selects `uf`, or clears the UF filter when it is already selected.
    /// Returns the new selection.
    pub async fn select_region(&self, uf: &str) -> Result<Option<String>, DashboardError> {
        let uf = uf.trim().to_uppercase();
        let current = self.filters.get(FilterKind::Uf);
        let next = toggle(current.as_deref(), &uf);
        tracing::debug!(uf = %uf, selected = ?next, "region clicked");

        self.filters.set_filter(FilterKind::Uf, next.clone());
        self.maps.apply_selection(next.as_deref());
        self.refresh_donut().await?;
        self.show_cities(next.as_deref()).await;

        Ok(next)
    }

    /// City labels of the selected UF on the impact map. A failed lookup
    /// leaves the map without labels.
    async fn show_cities(&self, uf: Option<&str>) {
        if self.maps.overlay(MAP_IMPACTO).is_none() {
            return;
        }
        let cidades = match uf {
            Some(uf) => match self.api.cidades_por_uf(uf).await {
                Ok(data) => data.cidades,
                Err(error) => {
                    tracing::warn!(uf, %error, "cities unavailable");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        self.maps.show_cities(MAP_IMPACTO, &cidades);
    }

    /// Same toggle on the objeto dimension; mirrors the encerrados table.
    pub fn select_objeto(&self, objeto: &str) -> Option<String> {
        let current = self.filters.get(FilterKind::Objeto);
        let next = toggle(current.as_deref(), objeto);
        tracing::debug!(objeto, selected = ?next, "objeto clicked");

        self.filters.set_filter(FilterKind::Objeto, next.clone());
        self.tables.mirror(next.as_deref());
        next
    }

    /// "Ver todos": drops the objeto selection.
    pub fn show_all_objetos(&self) {
        self.filters.set_filter(FilterKind::Objeto, None);
        self.tables.mirror(None);
    }

    /// Recomputes the donut for the current filters and patches it in place.
    /// The donut is rendered in full when it does not exist yet, and replaced
    /// by a message when it cannot be drawn.
    pub async fn refresh_donut(&self) -> Result<(), DashboardError> {
        let result = self.draw_donut().await;
        if let Err(error) = &result {
            self.charts.show_error(DONUT_WIDGET, &error.user_message());
        }
        result
    }

    async fn draw_donut(&self) -> Result<(), DashboardError> {
        let shares = self.baseline_shares().await?;
        let view = DonutView::derive(&shares, &self.filters.filters())?;

        let live = self
            .charts
            .handle(DONUT_WIDGET)
            .filter(|handle| !handle.borrow().is_destroyed());

        if let Some(handle) = live {
            let mut widget = handle.borrow_mut();
            widget.apply(&view.to_patch());
            widget.update(UpdateMode::Active);
            return Ok(());
        }

        let timings = *self.charts.timings();
        self.charts
            .create_with_retry(
                DONUT_WIDGET,
                &view.to_config(),
                timings.retry_attempts,
                timings.retry_delay,
            )
            .await
            .map(|_| ())
            .ok_or_else(|| DashboardError::RenderFailed(DONUT_WIDGET.to_string()))
    }

    async fn baseline_shares(&self) -> Result<Vec<UfShare>, DashboardError> {
        let objeto = self.filters.get(FilterKind::Objeto);
        let cached = self
            .baseline
            .borrow()
            .as_ref()
            .filter(|baseline| baseline.objeto == objeto)
            .map(|baseline| baseline.shares.clone());
        if let Some(shares) = cached {
            return Ok(shares);
        }

        let data = self.api.analise_correlacao_all_ufs(objeto.as_deref()).await?;
        self.cache_baseline(objeto.as_deref(), data.distribuicao_uf.clone());
        Ok(data.distribuicao_uf)
    }
}
