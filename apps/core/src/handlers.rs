use std::rc::Rc;

use async_trait::async_trait;

use crate::api::ApiClient;
use crate::colors::{self, Palette};
use crate::cross_filter::{CrossFilterCoordinator, DONUT_WIDGET};
use crate::domain::{KpisFinais, SaldoResumo};
use crate::error::{DashboardError, ViewModelError};
use crate::filters::{FilterKind, FilterStore};
use crate::format::{format_currency, format_days, format_number, format_percent};
use crate::lifecycle::ChartLifecycleManager;
use crate::maps::{MapsController, RegionClick, MAP_IMPACTO, MAP_NACIONAL};
use crate::render::{ChartConfig, ChartKind};
use crate::sections::SectionHandler;
use crate::surface::Surface;
use crate::tables::{
    TablesController, TABLE_CASOS_CRITICOS, TABLE_ENCERRADOS, TABLE_ENTRADAS, TABLE_REINCIDENCIA,
    TABLE_SALDO,
};
use crate::view_model::{self, Series};

pub const CHART_SALDO: &str = "chart-saldo";
pub const CHART_EVOLUCAO: &str = "chart-evolucao";
pub const CHART_TEMPO_MEDIO: &str = "chart-tempo-medio";
pub const CHART_REITERACOES: &str = "chart-reiteracoes";
pub const CHART_REINCIDENCIA: &str = "chart-reincidencia";

/// Guards the whole fetch+render of the reload-exempt reiteracoes chart.
pub const REITERACOES_LOCK: &str = "reiteracoes:load";

pub const TEXT_SALDO_ENTRADAS: &str = "saldo-entradas";
pub const TEXT_SALDO_ENCERRADOS: &str = "saldo-encerrados";
pub const TEXT_SALDO_TOTAL: &str = "saldo-total";
pub const TEXT_TOTAL_ACOES: &str = "kpi-total-acoes";
pub const TEXT_TOTAL_ENCERRAMENTOS: &str = "kpi-total-encerramentos";
pub const TEXT_MEDIA_PAGAMENTO: &str = "kpi-media-pagamento";
pub const TEXT_TEMPO_MEDIO: &str = "tempo-medio-geral";
pub const TEXT_TAXA_REINCIDENCIA: &str = "taxa-reincidencia";
pub const TEXT_FINAL_CASOS: &str = "kpi-final-casos";
pub const TEXT_FINAL_IMPACTO: &str = "kpi-final-impacto";
pub const TEXT_FINAL_MEDIA: &str = "kpi-final-media";
pub const TEXT_FINAL_CRITICOS: &str = "kpi-final-criticos";
pub const TEXT_FINAL_TAXA: &str = "kpi-final-taxa";

/// Placeholder for a KPI whose source failed.
pub const MISSING_VALUE: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    EntradasEncerrados,
    Saldo,
    EstatisticasGerais,
    Evolucao,
    MapaNacional,
    TempoMedio,
    Reiteracoes,
    Reincidencia,
    CasosCriticos,
    KpisFinais,
    AnaliseImpacto,
}

impl Section {
    pub const ALL: [Self; 11] = [
        Self::EntradasEncerrados,
        Self::Saldo,
        Self::EstatisticasGerais,
        Self::Evolucao,
        Self::MapaNacional,
        Self::TempoMedio,
        Self::Reiteracoes,
        Self::Reincidencia,
        Self::CasosCriticos,
        Self::KpisFinais,
        Self::AnaliseImpacto,
    ];

    /// Element id of the section.
    pub const fn id(self) -> &'static str {
        match self {
            Self::EntradasEncerrados => "entradas-encerrados",
            Self::Saldo => "saldo-entradas-encerramentos",
            Self::EstatisticasGerais => "estatisticas-gerais",
            Self::Evolucao => "evolucao",
            Self::MapaNacional => "mapa-nacional",
            Self::TempoMedio => "tempo-medio",
            Self::Reiteracoes => "reiteracoes",
            Self::Reincidencia => "reincidencia",
            Self::CasosCriticos => "casos-criticos",
            Self::KpisFinais => "kpis-finais",
            Self::AnaliseImpacto => "slide-analise-impacto",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|section| section.id() == id)
    }

    /// Rendered again on every intersection.
    pub const fn reload_exempt(self) -> bool {
        matches!(self, Self::Reiteracoes)
    }

    /// Loaded at startup, above the fold.
    pub const fn eager(self) -> bool {
        matches!(self, Self::EntradasEncerrados)
    }

    /// Re-fetched when the filters change. Both maps and the impact donut
    /// are restyled in place by the cross-filter instead, so a bubble click
    /// never tears down the map it came from.
    pub const fn filter_sensitive(self) -> bool {
        !matches!(self, Self::AnaliseImpacto | Self::MapaNacional)
    }
}

/// Everything a section needs to fetch and draw.
pub struct SectionHandlers {
    pub api: Rc<ApiClient>,
    pub filters: Rc<FilterStore>,
    pub charts: Rc<ChartLifecycleManager>,
    pub maps: Rc<MapsController>,
    pub tables: Rc<TablesController>,
    pub surface: Rc<dyn Surface>,
    pub cross_filter: Rc<CrossFilterCoordinator>,
    pub on_region_click: RegionClick,
}

/// First error wins; every part still ran.
fn first_error(
    results: impl IntoIterator<Item = Result<(), DashboardError>>,
) -> Result<(), DashboardError> {
    results.into_iter().find(Result::is_err).unwrap_or(Ok(()))
}

impl SectionHandlers {
    pub async fn load(&self, section: Section) -> Result<(), DashboardError> {
        tracing::debug!(section = section.id(), "loading section");
        match section {
            Section::EntradasEncerrados => {
                let entradas = self.load_entradas().await;
                let encerrados = self.load_encerrados().await;
                first_error([entradas, encerrados])
            }
            Section::Saldo => {
                let table = self.load_saldo_table().await;
                let summary = self.load_saldo_summary().await;
                first_error([table, summary])
            }
            Section::EstatisticasGerais => self.load_estatisticas().await,
            Section::Evolucao => self.load_evolucao().await,
            Section::MapaNacional => self.load_mapa_nacional().await,
            Section::TempoMedio => self.load_tempo_medio().await,
            Section::Reiteracoes => self.load_reiteracoes().await,
            Section::Reincidencia => {
                let rate = self.load_reincidencia().await;
                let clients = self.load_reincidencia_clientes().await;
                first_error([rate, clients])
            }
            Section::CasosCriticos => self.load_casos_criticos().await,
            Section::KpisFinais => self.load_kpis_finais().await,
            Section::AnaliseImpacto => self.load_analise_impacto().await,
        }
    }

    fn table_failed(&self, table: &str, error: DashboardError) -> Result<(), DashboardError> {
        self.tables.show_error(table, &error.user_message());
        Err(error)
    }

    fn texts_failed(&self, ids: &[&str], error: DashboardError) -> Result<(), DashboardError> {
        for id in ids {
            self.surface.set_text(id, MISSING_VALUE);
        }
        Err(error)
    }

    /// Renders `config` into `id`. An empty series is a message, not a failure;
    /// a widget that cannot be created is replaced by a message too.
    async fn render_chart(
        &self,
        id: &str,
        config: Result<ChartConfig, ViewModelError>,
    ) -> Result<(), DashboardError> {
        let config = match config {
            Ok(config) => config,
            Err(error) => {
                let empty = matches!(error, ViewModelError::Empty(_));
                let error = DashboardError::from(error);
                self.charts.show_error(id, &error.user_message());
                return if empty { Ok(()) } else { Err(error) };
            }
        };

        let timings = *self.charts.timings();
        let created = self
            .charts
            .create_with_retry(id, &config, timings.retry_attempts, timings.retry_delay)
            .await;
        if created.is_some() {
            return Ok(());
        }
        self.chart_failed(id, DashboardError::RenderFailed(id.to_string()))
    }

    fn chart_failed(&self, id: &str, error: DashboardError) -> Result<(), DashboardError> {
        self.charts.show_error(id, &error.user_message());
        Err(error)
    }

    async fn load_entradas(&self) -> Result<(), DashboardError> {
        match self.api.entradas_por_objeto().await {
            Ok(data) => {
                self.tables.set_entradas(data.dados);
                Ok(())
            }
            Err(error) => self.table_failed(TABLE_ENTRADAS, error.into()),
        }
    }

    async fn load_encerrados(&self) -> Result<(), DashboardError> {
        match self.api.encerramentos_por_objeto().await {
            Ok(data) => {
                self.tables.set_encerrados(data.dados);
                self.tables
                    .mirror(self.filters.get(FilterKind::Objeto).as_deref());
                Ok(())
            }
            Err(error) => self.table_failed(TABLE_ENCERRADOS, error.into()),
        }
    }

    async fn load_saldo_table(&self) -> Result<(), DashboardError> {
        match self.api.saldo_por_objeto().await {
            Ok(data) => {
                self.tables.set_saldo(data);
                Ok(())
            }
            Err(error) => self.table_failed(TABLE_SALDO, error.into()),
        }
    }

    async fn load_saldo_summary(&self) -> Result<(), DashboardError> {
        let resumo = match self.api.saldo().await {
            Ok(resumo) => resumo,
            Err(error) => {
                let error = DashboardError::from(error);
                self.charts.show_error(CHART_SALDO, &error.user_message());
                return self.texts_failed(
                    &[TEXT_SALDO_ENTRADAS, TEXT_SALDO_ENCERRADOS, TEXT_SALDO_TOTAL],
                    error,
                );
            }
        };

        self.surface
            .set_text(TEXT_SALDO_ENTRADAS, &format_number(resumo.entradas));
        self.surface
            .set_text(TEXT_SALDO_ENCERRADOS, &format_number(resumo.encerrados));
        self.surface
            .set_text(TEXT_SALDO_TOTAL, &format_number(resumo.saldo));

        self.render_chart(CHART_SALDO, saldo_chart(&resumo)).await
    }

    async fn load_estatisticas(&self) -> Result<(), DashboardError> {
        let ids = [TEXT_TOTAL_ACOES, TEXT_TOTAL_ENCERRAMENTOS, TEXT_MEDIA_PAGAMENTO];
        match self.api.estatisticas_gerais().await {
            Ok(data) => {
                self.surface
                    .set_text(TEXT_TOTAL_ACOES, &format_number(data.total_acoes));
                self.surface.set_text(
                    TEXT_TOTAL_ENCERRAMENTOS,
                    &format_number(data.total_encerramentos),
                );
                self.surface
                    .set_text(TEXT_MEDIA_PAGAMENTO, &format_currency(data.media_pagamento));
                Ok(())
            }
            Err(error) => self.texts_failed(&ids, error.into()),
        }
    }

    async fn load_evolucao(&self) -> Result<(), DashboardError> {
        let evolucao = match self.api.evolucao().await {
            Ok(evolucao) => evolucao,
            Err(error) => return self.chart_failed(CHART_EVOLUCAO, error.into()),
        };

        let points = evolucao.sorted();
        let labels = points
            .iter()
            .map(|point| point.periodo.clone().unwrap_or_else(|| "N/A".to_string()))
            .collect();
        let config = view_model::series_chart(
            ChartKind::Line,
            "Evolução Mensal",
            labels,
            vec![
                Series::new(
                    "Entradas",
                    points.iter().map(|point| point.entradas).collect(),
                    colors::SERIES_BLUE,
                )
                .filled(),
                Series::new(
                    "Encerramentos",
                    points.iter().map(|point| point.encerramentos).collect(),
                    colors::SERIES_ORANGE,
                )
                .filled(),
            ],
        );
        self.render_chart(CHART_EVOLUCAO, config).await
    }

    fn map_failed(&self, container: &str, error: DashboardError) -> Result<(), DashboardError> {
        self.maps.show_error(container, &error.user_message());
        Err(error)
    }

    async fn load_mapa_nacional(&self) -> Result<(), DashboardError> {
        let mapa = match self.api.mapa_nacional().await {
            Ok(mapa) => mapa,
            Err(error) => return self.map_failed(MAP_NACIONAL, error.into()),
        };
        let selected = self.filters.get(FilterKind::Uf);
        match self
            .maps
            .render_national(&mapa.estados, selected.as_deref(), &self.on_region_click)
        {
            Ok(_) => Ok(()),
            Err(error) => self.map_failed(MAP_NACIONAL, error.into()),
        }
    }

    async fn load_tempo_medio(&self) -> Result<(), DashboardError> {
        let data = match self.api.tempo_medio().await {
            Ok(data) => data,
            Err(error) => {
                self.surface.set_text(TEXT_TEMPO_MEDIO, MISSING_VALUE);
                return self.chart_failed(CHART_TEMPO_MEDIO, error.into());
            }
        };

        self.surface
            .set_text(TEXT_TEMPO_MEDIO, &format_days(data.media_geral));

        let labels = data
            .por_objeto
            .iter()
            .map(|row| row.objeto.clone().unwrap_or_else(|| "N/A".to_string()))
            .collect();
        let values = data.por_objeto.iter().map(|row| row.tempo_medio).collect();
        let config =
            view_model::categorical_bars("Tempo Médio (dias)", labels, values, Palette::Area);
        self.render_chart(CHART_TEMPO_MEDIO, config).await
    }

    /// Re-entered on every intersection, so one fetch+render runs at a time.
    /// A trigger that finds the sequence locked is dropped.
    async fn load_reiteracoes(&self) -> Result<(), DashboardError> {
        let Some(ticket) = self.charts.try_lock(REITERACOES_LOCK) else {
            tracing::debug!("reiteracoes already rendering, skipping");
            return Ok(());
        };
        let result = self.render_reiteracoes().await;
        self.charts.unlock(REITERACOES_LOCK, ticket);
        result
    }

    async fn render_reiteracoes(&self) -> Result<(), DashboardError> {
        let data = match self.api.reiteracoes().await {
            Ok(data) => data,
            Err(error) => return self.chart_failed(CHART_REITERACOES, error.into()),
        };

        let labels = data
            .dados
            .iter()
            .map(|row| row.objeto.clone().unwrap_or_else(|| "N/A".to_string()))
            .collect();
        let config = view_model::series_chart(
            ChartKind::Bar,
            "Reiterações por Objeto",
            labels,
            vec![Series::new(
                "Total de Reiterações",
                data.dados.iter().map(|row| row.total_reiteracoes).collect(),
                colors::NEGATIVE,
            )],
        );
        self.render_chart(CHART_REITERACOES, config).await
    }

    async fn load_reincidencia(&self) -> Result<(), DashboardError> {
        let data = match self.api.reincidencia().await {
            Ok(data) => data,
            Err(error) => {
                self.surface.set_text(TEXT_TAXA_REINCIDENCIA, MISSING_VALUE);
                return self.chart_failed(CHART_REINCIDENCIA, error.into());
            }
        };

        self.surface
            .set_text(TEXT_TAXA_REINCIDENCIA, &format_percent(data.taxa_reincidencia));

        let nao_reincidentes = (data.total - data.reincidentes).max(0.0);
        let config = view_model::colored_series(
            ChartKind::Doughnut,
            "Reincidência",
            vec!["Reincidentes".to_string(), "Não Reincidentes".to_string()],
            vec![data.reincidentes, nao_reincidentes],
            &[colors::NEGATIVE, colors::POSITIVE],
        );
        self.render_chart(CHART_REINCIDENCIA, config).await
    }

    async fn load_reincidencia_clientes(&self) -> Result<(), DashboardError> {
        match self.api.reincidencia_por_cliente().await {
            Ok(data) => {
                self.tables.set_reincidencia(data.dados);
                Ok(())
            }
            Err(error) => self.table_failed(TABLE_REINCIDENCIA, error.into()),
        }
    }

    async fn load_casos_criticos(&self) -> Result<(), DashboardError> {
        match self.api.casos_criticos().await {
            Ok(data) => {
                self.tables.set_casos_criticos(data.dados);
                Ok(())
            }
            Err(error) => self.table_failed(TABLE_CASOS_CRITICOS, error.into()),
        }
    }

    async fn load_kpis_finais(&self) -> Result<(), DashboardError> {
        match self.api.kpis_finais().await {
            Ok(kpis) => {
                self.write_final_kpis(&kpis);
                Ok(())
            }
            Err(error) => self.texts_failed(
                &[
                    TEXT_FINAL_CASOS,
                    TEXT_FINAL_IMPACTO,
                    TEXT_FINAL_MEDIA,
                    TEXT_FINAL_CRITICOS,
                    TEXT_FINAL_TAXA,
                ],
                error.into(),
            ),
        }
    }

    fn write_final_kpis(&self, kpis: &KpisFinais) {
        self.surface
            .set_text(TEXT_FINAL_CASOS, &format_number(kpis.total_casos));
        self.surface
            .set_text(TEXT_FINAL_IMPACTO, &format_currency(kpis.total_impacto));
        self.surface
            .set_text(TEXT_FINAL_MEDIA, &format_currency(kpis.media_impacto));
        self.surface
            .set_text(TEXT_FINAL_CRITICOS, &format_number(kpis.casos_criticos));
        self.surface
            .set_text(TEXT_FINAL_TAXA, &format_percent(kpis.taxa_encerramento));
    }

    /// Donut of per-UF shares next to the impact map. Both come from the
    /// all-UF payload so a selection can be highlighted against the rest.
    async fn load_analise_impacto(&self) -> Result<(), DashboardError> {
        let objeto = self.filters.get(FilterKind::Objeto);
        let data = match self.api.analise_correlacao_all_ufs(objeto.as_deref()).await {
            Ok(data) => data,
            Err(error) => {
                let error = DashboardError::from(error);
                self.charts.show_error(DONUT_WIDGET, &error.user_message());
                return self.map_failed(MAP_IMPACTO, error);
            }
        };
        self.cross_filter
            .cache_baseline(objeto.as_deref(), data.distribuicao_uf.clone());

        let capitais = match self.api.capitais(None).await {
            Ok(capitais) => capitais.capitais,
            Err(error) => {
                tracing::warn!(%error, "capitals unavailable, using built-in coordinates");
                Vec::new()
            }
        };
        let selected = self.filters.get(FilterKind::Uf);
        let map = match self.maps.render_impact(
            &data.mapa.estados,
            &capitais,
            selected.as_deref(),
            &self.on_region_click,
        ) {
            Ok(_) => Ok(()),
            Err(error) => self.map_failed(MAP_IMPACTO, error.into()),
        };

        let donut = self.cross_filter.refresh_donut().await;
        first_error([donut, map])
    }
}

fn saldo_chart(resumo: &SaldoResumo) -> Result<ChartConfig, ViewModelError> {
    view_model::colored_series(
        ChartKind::Bar,
        "Saldo",
        vec![
            "Entradas".to_string(),
            "Encerrados".to_string(),
            "Saldo".to_string(),
        ],
        vec![resumo.entradas, resumo.encerrados, resumo.saldo],
        &[colors::SERIES_BLUE, colors::POSITIVE, colors::SERIES_ORANGE],
    )
}

/// Binds one section to the shared handlers.
pub struct SectionTask {
    handlers: Rc<SectionHandlers>,
    section: Section,
}

impl SectionTask {
    pub fn new(handlers: Rc<SectionHandlers>, section: Section) -> Self {
        Self { handlers, section }
    }
}

#[async_trait(?Send)]
impl SectionHandler for SectionTask {
    async fn load(&self) -> Result<(), DashboardError> {
        self.handlers.load(self.section).await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::Harness;
    use crate::visibility::Rect;

    #[test]
    fn section_ids_round_trip_and_flags() {
        for section in Section::ALL {
            assert_eq!(Section::from_id(section.id()), Some(section));
        }
        let exempt: Vec<_> = Section::ALL
            .into_iter()
            .filter(|section| section.reload_exempt())
            .collect();
        assert_eq!(exempt, vec![Section::Reiteracoes]);
        assert!(Section::EntradasEncerrados.eager());
        let restyled: Vec<_> = Section::ALL
            .into_iter()
            .filter(|section| !section.filter_sensitive())
            .collect();
        assert_eq!(restyled, vec![Section::MapaNacional, Section::AnaliseImpacto]);
    }

    #[tokio::test(start_paused = true)]
    async fn saldo_fills_table_texts_and_chart() {
        let h = Harness::new();
        h.transport.respond(
            "/saldo/por-objeto",
            r#"{"dados": [{"objeto_acao": "Cobrança", "qtd_entradas": 10,
                           "qtd_encerramentos": 4, "saldo": 6}],
                "total_entradas": 10, "total_encerramentos": 4, "total_saldo": 6}"#,
        );
        h.transport.respond(
            "/saldo/",
            r#"{"entradas": 1234, "encerrados": 1000, "saldo": 234}"#,
        );
        h.probe.set_rect(CHART_SALDO, Rect::new(0.0, 0.0, 600.0, 300.0));

        h.handlers.load(Section::Saldo).await.unwrap();

        assert_eq!(h.surface.text(TEXT_SALDO_ENTRADAS).as_deref(), Some("1.234"));
        assert_eq!(h.surface.text(TEXT_SALDO_TOTAL).as_deref(), Some("234"));
        let table = h.surface.table(TABLE_SALDO).expect("saldo table");
        assert_eq!(table.first_column(), vec!["Cobrança", "TOTAL"]);
        let config = h.backend.last_config(CHART_SALDO).expect("saldo chart");
        assert_eq!(config.labels, vec!["Entradas", "Encerrados", "Saldo"]);
        assert_eq!(config.datasets[0].data, vec![1234.0, 1000.0, 234.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_becomes_table_message_and_error() {
        let h = Harness::new();
        h.transport.fail("/indicadores/casos-criticos");

        let result = h.handlers.load(Section::CasosCriticos).await;

        assert!(matches!(result, Err(DashboardError::Api(_))));
        assert_eq!(
            h.surface
                .table(TABLE_CASOS_CRITICOS)
                .and_then(|table| table.message),
            Some("Erro: backend não respondeu".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn empty_series_shows_message_without_failing() {
        let h = Harness::new();
        h.transport.respond("/indicadores/reiteracoes", r#"{"dados": []}"#);
        h.probe
            .set_rect(CHART_REITERACOES, Rect::new(0.0, 0.0, 600.0, 300.0));

        h.handlers.load(Section::Reiteracoes).await.unwrap();

        assert_eq!(
            h.backend.errors(),
            vec![(
                CHART_REITERACOES.to_string(),
                "Sem dados para esta seleção".to_string()
            )]
        );
        assert_eq!(h.backend.create_count(CHART_REITERACOES), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reiteracoes_skip_while_a_render_holds_the_lock() {
        let h = Harness::new();
        h.transport.respond("/indicadores/reiteracoes", r#"{"dados": []}"#);

        let held = h
            .charts
            .try_lock(REITERACOES_LOCK)
            .expect("lock should be free");
        h.handlers.load(Section::Reiteracoes).await.unwrap();
        assert!(h.transport.urls().is_empty());

        h.charts.unlock(REITERACOES_LOCK, held);
        h.handlers.load(Section::Reiteracoes).await.unwrap();
        assert_eq!(
            h.transport.urls(),
            vec!["http://api.test/api/indicadores/reiteracoes"]
        );
        assert!(!h.charts.is_locked(REITERACOES_LOCK));
    }

    #[tokio::test(start_paused = true)]
    async fn evolucao_is_a_sorted_two_series_line() {
        let h = Harness::new();
        h.transport.respond(
            "/indicadores/evolucao",
            r#"{"dados": [
                {"periodo": "2024-02", "entradas": 5, "encerramentos": 2},
                {"periodo": "2024-01", "entradas": 3, "encerramentos": "4"}
            ]}"#,
        );
        h.probe
            .set_rect(CHART_EVOLUCAO, Rect::new(0.0, 0.0, 600.0, 300.0));

        h.handlers.load(Section::Evolucao).await.unwrap();

        let config = h.backend.last_config(CHART_EVOLUCAO).expect("evolution chart");
        assert_eq!(config.kind, ChartKind::Line);
        assert_eq!(config.labels, vec!["2024-01", "2024-02"]);
        assert_eq!(config.datasets[1].data, vec![4.0, 2.0]);
        assert!(config.datasets.iter().all(|dataset| dataset.fill));
    }

    #[tokio::test(start_paused = true)]
    async fn kpis_finais_are_formatted() {
        let h = Harness::new();
        h.transport.respond(
            "/indicadores/kpis-finais",
            r#"{"total_casos": 396, "total_impacto": 1500.5, "media_impacto": 10,
                "casos_criticos": 12, "taxa_encerramento": 66.66}"#,
        );

        h.handlers.load(Section::KpisFinais).await.unwrap();

        assert_eq!(h.surface.text(TEXT_FINAL_CASOS).as_deref(), Some("396"));
        assert_eq!(h.surface.text(TEXT_FINAL_IMPACTO).as_deref(), Some("R$ 1.500,50"));
        assert_eq!(h.surface.text(TEXT_FINAL_TAXA).as_deref(), Some("66.7%"));
    }

    #[tokio::test(start_paused = true)]
    async fn national_map_uses_the_current_selection() {
        let h = Harness::new();
        h.transport.respond(
            "/mapas/nacional",
            r#"{"estados": [
                {"estado": "SP", "quantidade": 100, "impacto_total": 200000},
                {"estado": "RJ", "quantidade": 50, "impacto_total": 100000}
            ]}"#,
        );
        h.filters.set_filter(FilterKind::Uf, Some("RJ".to_string()));

        h.handlers.load(Section::MapaNacional).await.unwrap();

        assert_eq!(
            h.map_backend.style(MAP_NACIONAL, "RJ").map(|style| style.weight),
            Some(4)
        );
        assert_eq!(
            h.transport.urls(),
            vec!["http://api.test/api/mapas/nacional?estado=RJ"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_national_map_shows_a_message_in_its_place() {
        let h = Harness::new();
        h.transport.fail("/mapas/nacional");

        let result = h.handlers.load(Section::MapaNacional).await;

        assert!(matches!(result, Err(DashboardError::Api(_))));
        assert_eq!(h.map_backend.created(MAP_NACIONAL), 0);
        assert_eq!(
            h.map_backend.errors(),
            vec![(
                MAP_NACIONAL.to_string(),
                "Erro: backend não respondeu".to_string()
            )]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn chart_that_cannot_be_created_shows_a_message() {
        let h = Harness::new();
        h.transport.respond(
            "/indicadores/reiteracoes",
            r#"{"dados": [{"objeto": "Cobrança", "total_reiteracoes": 3}]}"#,
        );

        let result = h.handlers.load(Section::Reiteracoes).await;

        assert_eq!(
            result,
            Err(DashboardError::RenderFailed(CHART_REITERACOES.to_string()))
        );
        assert_eq!(
            h.backend.errors(),
            vec![(
                CHART_REITERACOES.to_string(),
                "Não foi possível exibir o gráfico".to_string()
            )]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_impact_payload_marks_donut_and_map() {
        let h = Harness::new();
        h.transport.fail("/indicadores/analise-correlacao");

        let result = h.handlers.load(Section::AnaliseImpacto).await;

        assert!(matches!(result, Err(DashboardError::Api(_))));
        let message = "Erro: backend não respondeu".to_string();
        assert_eq!(
            h.backend.errors(),
            vec![(DONUT_WIDGET.to_string(), message.clone())]
        );
        assert_eq!(
            h.map_backend.errors(),
            vec![(MAP_IMPACTO.to_string(), message)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn impact_slide_draws_donut_and_map_from_one_payload() {
        let h = Harness::new();
        h.transport.respond(
            "/indicadores/analise-correlacao",
            r#"{"mapa": {"estados": [{"estado": "SP", "quantidade": 100, "impacto_total": 5}]},
                "distribuicao_uf": [{"uf": "SP", "quantidade": 100},
                                    {"uf": "RJ", "quantidade": 50}]}"#,
        );
        h.transport.respond("/mapas/capitais", r#"{"capitais": []}"#);
        h.probe.set_rect(DONUT_WIDGET, Rect::new(0.0, 0.0, 400.0, 400.0));

        h.handlers.load(Section::AnaliseImpacto).await.unwrap();

        assert_eq!(h.backend.create_count(DONUT_WIDGET), 1);
        assert_eq!(h.map_backend.created(MAP_IMPACTO), 1);
        assert_eq!(
            h.transport.urls(),
            vec![
                "http://api.test/api/indicadores/analise-correlacao",
                "http://api.test/api/mapas/capitais",
            ]
        );
    }
}
