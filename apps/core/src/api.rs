use std::rc::Rc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{ApiConfig, API_KEY_HEADER};
use crate::domain::{
    AcoesGanhasPerdidas, AnaliseCorrelacao, AreasResponsaveis, Capitais, CasosCriticos,
    CasosImpacto, CasosObjetosPorUf, Cidades, ErroSistemico, EstatisticasGerais, Evolucao,
    KpisFinais, MaiorReiteracao, MapaNacional, ObjetoPorEstado, Pareto, PorObjeto, Reincidencia,
    ReincidenciaPorCliente, Reiteracoes, SaldoPorObjeto, SaldoResumo, Sentencas, SentencasPorArea,
    SlaArea, SlaSubsidioPorArea, SolicitacoesPrazo, SolicitacoesPrazoPorArea, TempoMedio,
    TiposAcoes, VolumeCusto,
};
use crate::error::ApiError;
use crate::filters::{FilterKind, FilterStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// One GET round trip. Implementations only report [`ApiError::Network`];
/// status and body interpretation belong to [`ApiClient`].
#[async_trait(?Send)]
pub trait HttpTransport {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse, ApiError>;
}

/// Parameterless analytic endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    EntradasPorObjeto,
    EncerramentosPorObjeto,
    Saldo,
    SaldoPorObjeto,
    MapaNacional,
    Capitais,
    Evolucao,
    ObjetoPorEstado,
    TempoMedio,
    CasosImpacto,
    SlaArea,
    SolicitacoesPrazo,
    SolicitacoesPrazoPorArea,
    AreasResponsaveis,
    SlaSubsidioPorArea,
    CasosObjetosPorUf,
    VolumeCusto,
    Reiteracoes,
    Pareto,
    CasosCriticos,
    Sentencas,
    SentencasPorArea,
    Reincidencia,
    ReincidenciaPorCliente,
    TiposAcoes2025,
    ErroSistemico,
    MaiorReiteracao,
    KpisFinais,
    EstatisticasGerais,
    AcoesGanhasPerdidas,
    AnaliseCorrelacao,
}

impl Endpoint {
    pub const ALL: [Self; 31] = [
        Self::EntradasPorObjeto,
        Self::EncerramentosPorObjeto,
        Self::Saldo,
        Self::SaldoPorObjeto,
        Self::MapaNacional,
        Self::Capitais,
        Self::Evolucao,
        Self::ObjetoPorEstado,
        Self::TempoMedio,
        Self::CasosImpacto,
        Self::SlaArea,
        Self::SolicitacoesPrazo,
        Self::SolicitacoesPrazoPorArea,
        Self::AreasResponsaveis,
        Self::SlaSubsidioPorArea,
        Self::CasosObjetosPorUf,
        Self::VolumeCusto,
        Self::Reiteracoes,
        Self::Pareto,
        Self::CasosCriticos,
        Self::Sentencas,
        Self::SentencasPorArea,
        Self::Reincidencia,
        Self::ReincidenciaPorCliente,
        Self::TiposAcoes2025,
        Self::ErroSistemico,
        Self::MaiorReiteracao,
        Self::KpisFinais,
        Self::EstatisticasGerais,
        Self::AcoesGanhasPerdidas,
        Self::AnaliseCorrelacao,
    ];

    pub const fn path(self) -> &'static str {
        match self {
            Self::EntradasPorObjeto => "/entradas/por-objeto",
            Self::EncerramentosPorObjeto => "/encerramentos/por-objeto",
            Self::Saldo => "/saldo/",
            Self::SaldoPorObjeto => "/saldo/por-objeto",
            Self::MapaNacional => "/mapas/nacional",
            Self::Capitais => "/mapas/capitais",
            Self::Evolucao => "/indicadores/evolucao",
            Self::ObjetoPorEstado => "/indicadores/objeto-por-estado",
            Self::TempoMedio => "/indicadores/tempo-medio",
            Self::CasosImpacto => "/indicadores/casos-impacto",
            Self::SlaArea => "/indicadores/sla-area",
            Self::SolicitacoesPrazo => "/indicadores/solicitacoes-prazo",
            Self::SolicitacoesPrazoPorArea => "/indicadores/solicitacoes-prazo-por-area",
            Self::AreasResponsaveis => "/indicadores/areas-responsaveis",
            Self::SlaSubsidioPorArea => "/indicadores/sla-subsidio-por-area",
            Self::CasosObjetosPorUf => "/indicadores/casos-objetos-por-uf",
            Self::VolumeCusto => "/indicadores/volume-custo",
            Self::Reiteracoes => "/indicadores/reiteracoes",
            Self::Pareto => "/indicadores/pareto",
            Self::CasosCriticos => "/indicadores/casos-criticos",
            Self::Sentencas => "/indicadores/sentencas",
            Self::SentencasPorArea => "/indicadores/sentencas-por-area",
            Self::Reincidencia => "/indicadores/reincidencia",
            Self::ReincidenciaPorCliente => "/indicadores/reincidencia-por-cliente",
            Self::TiposAcoes2025 => "/indicadores/tipos-acoes-2025",
            Self::ErroSistemico => "/indicadores/erro-sistemico",
            Self::MaiorReiteracao => "/indicadores/maior-reiteracao",
            Self::KpisFinais => "/indicadores/kpis-finais",
            Self::EstatisticasGerais => "/indicadores/estatisticas-gerais",
            Self::AcoesGanhasPerdidas => "/indicadores/acoes-ganhas-perdidas",
            Self::AnaliseCorrelacao => "/indicadores/analise-correlacao",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Filtered,
    Unfiltered,
}

pub struct ApiClient {
    transport: Rc<dyn HttpTransport>,
    config: ApiConfig,
    filters: Rc<FilterStore>,
}

impl ApiClient {
    pub fn new(
        transport: Rc<dyn HttpTransport>,
        config: ApiConfig,
        filters: Rc<FilterStore>,
    ) -> Self {
        Self {
            transport,
            config,
            filters,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Full URL for `path`, with `estado=<UF>` appended when a UF is selected.
    pub fn url_for(&self, path: &str) -> String {
        self.build_url(path, Scope::Filtered)
    }

    fn build_url(&self, path: &str, scope: Scope) -> String {
        let mut url = format!("{}{path}", self.config.base_url);

        let uf = match scope {
            Scope::Filtered => self.filters.get(FilterKind::Uf),
            Scope::Unfiltered => None,
        }
        .map(|uf| uf.trim().to_uppercase())
        .filter(|uf| !uf.is_empty());
        if let Some(uf) = uf {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str("estado=");
            url.extend(url::form_urlencoded::byte_serialize(uf.as_bytes()));
        }
        url
    }

    fn headers(&self) -> Vec<(String, String)> {
        self.config
            .api_key
            .iter()
            .map(|key| (API_KEY_HEADER.to_string(), key.clone()))
            .collect()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.fetch(path, Scope::Filtered).await
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str, scope: Scope) -> Result<T, ApiError> {
        let url = self.build_url(path, scope);
        tracing::debug!(%url, "GET");

        let response = self
            .transport
            .get(&url, &self.headers())
            .await
            .inspect_err(|error| tracing::error!(%url, %error, "request failed"))?;

        if !response.is_success() {
            let error = ApiError::HttpStatus {
                message: server_detail(&response.body),
                status: response.status,
                url,
            };
            tracing::error!(%error, "backend returned an error status");
            return Err(error);
        }

        if response.body.trim().is_empty() {
            return Err(ApiError::MalformedResponse {
                url,
                reason: "empty body".to_string(),
            });
        }

        serde_json::from_str(&response.body).map_err(|error| {
            tracing::error!(%url, %error, "response is not the expected JSON");
            ApiError::MalformedResponse {
                url,
                reason: error.to_string(),
            }
        })
    }

    /// Untyped access to any parameterless endpoint.
    pub async fn endpoint(&self, endpoint: Endpoint) -> Result<Value, ApiError> {
        self.get(endpoint.path()).await
    }

    pub async fn entradas_por_objeto(&self) -> Result<PorObjeto, ApiError> {
        self.get(Endpoint::EntradasPorObjeto.path()).await
    }

    pub async fn encerramentos_por_objeto(&self) -> Result<PorObjeto, ApiError> {
        self.get(Endpoint::EncerramentosPorObjeto.path()).await
    }

    pub async fn saldo(&self) -> Result<SaldoResumo, ApiError> {
        self.get(Endpoint::Saldo.path()).await
    }

    pub async fn saldo_por_objeto(&self) -> Result<SaldoPorObjeto, ApiError> {
        self.get(Endpoint::SaldoPorObjeto.path()).await
    }

    pub async fn mapa_nacional(&self) -> Result<MapaNacional, ApiError> {
        self.get(Endpoint::MapaNacional.path()).await
    }

    pub async fn capitais(&self, uf: Option<&str>) -> Result<Capitais, ApiError> {
        match uf {
            Some(uf) => self.get(&with_param(Endpoint::Capitais.path(), "uf", uf)).await,
            None => self.get(Endpoint::Capitais.path()).await,
        }
    }

    pub async fn cidades_por_uf(&self, uf: &str) -> Result<Cidades, ApiError> {
        self.get(&with_param("/mapas/cidades-por-uf", "uf", uf)).await
    }

    pub async fn evolucao(&self) -> Result<Evolucao, ApiError> {
        self.get(Endpoint::Evolucao.path()).await
    }

    pub async fn tempo_medio(&self) -> Result<TempoMedio, ApiError> {
        self.get(Endpoint::TempoMedio.path()).await
    }

    pub async fn reiteracoes(&self) -> Result<Reiteracoes, ApiError> {
        self.get(Endpoint::Reiteracoes.path()).await
    }

    pub async fn casos_criticos(&self) -> Result<CasosCriticos, ApiError> {
        self.get(Endpoint::CasosCriticos.path()).await
    }

    pub async fn reincidencia(&self) -> Result<Reincidencia, ApiError> {
        self.get(Endpoint::Reincidencia.path()).await
    }

    pub async fn reincidencia_por_cliente(&self) -> Result<ReincidenciaPorCliente, ApiError> {
        self.get(Endpoint::ReincidenciaPorCliente.path()).await
    }

    pub async fn kpis_finais(&self) -> Result<KpisFinais, ApiError> {
        self.get(Endpoint::KpisFinais.path()).await
    }

    pub async fn estatisticas_gerais(&self) -> Result<EstatisticasGerais, ApiError> {
        self.get(Endpoint::EstatisticasGerais.path()).await
    }

    pub async fn objeto_por_estado(&self) -> Result<ObjetoPorEstado, ApiError> {
        self.get(Endpoint::ObjetoPorEstado.path()).await
    }

    pub async fn casos_impacto(&self) -> Result<CasosImpacto, ApiError> {
        self.get(Endpoint::CasosImpacto.path()).await
    }

    pub async fn sla_area(&self) -> Result<SlaArea, ApiError> {
        self.get(Endpoint::SlaArea.path()).await
    }

    pub async fn solicitacoes_prazo(&self) -> Result<SolicitacoesPrazo, ApiError> {
        self.get(Endpoint::SolicitacoesPrazo.path()).await
    }

    pub async fn solicitacoes_prazo_por_area(&self) -> Result<SolicitacoesPrazoPorArea, ApiError> {
        self.get(Endpoint::SolicitacoesPrazoPorArea.path()).await
    }

    pub async fn areas_responsaveis(&self) -> Result<AreasResponsaveis, ApiError> {
        self.get(Endpoint::AreasResponsaveis.path()).await
    }

    pub async fn sla_subsidio_por_area(&self) -> Result<SlaSubsidioPorArea, ApiError> {
        self.get(Endpoint::SlaSubsidioPorArea.path()).await
    }

    pub async fn casos_objetos_por_uf(&self) -> Result<CasosObjetosPorUf, ApiError> {
        self.get(Endpoint::CasosObjetosPorUf.path()).await
    }

    pub async fn volume_custo(&self) -> Result<VolumeCusto, ApiError> {
        self.get(Endpoint::VolumeCusto.path()).await
    }

    pub async fn pareto(&self) -> Result<Pareto, ApiError> {
        self.get(Endpoint::Pareto.path()).await
    }

    pub async fn sentencas(&self) -> Result<Sentencas, ApiError> {
        self.get(Endpoint::Sentencas.path()).await
    }

    pub async fn sentencas_por_area(&self) -> Result<SentencasPorArea, ApiError> {
        self.get(Endpoint::SentencasPorArea.path()).await
    }

    pub async fn tipos_acoes_2025(&self) -> Result<TiposAcoes, ApiError> {
        self.get(Endpoint::TiposAcoes2025.path()).await
    }

    pub async fn erro_sistemico(&self) -> Result<ErroSistemico, ApiError> {
        self.get(Endpoint::ErroSistemico.path()).await
    }

    pub async fn maior_reiteracao(&self) -> Result<MaiorReiteracao, ApiError> {
        self.get(Endpoint::MaiorReiteracao.path()).await
    }

    pub async fn acoes_ganhas_perdidas(&self) -> Result<AcoesGanhasPerdidas, ApiError> {
        self.get(Endpoint::AcoesGanhasPerdidas.path()).await
    }

    pub async fn analise_correlacao(
        &self,
        filtro_objeto: Option<&str>,
    ) -> Result<AnaliseCorrelacao, ApiError> {
        self.fetch(&correlacao_path(filtro_objeto), Scope::Filtered)
            .await
    }

    /// Every UF regardless of the selection; the donut highlights from this.
    pub async fn analise_correlacao_all_ufs(
        &self,
        filtro_objeto: Option<&str>,
    ) -> Result<AnaliseCorrelacao, ApiError> {
        self.fetch(&correlacao_path(filtro_objeto), Scope::Unfiltered)
            .await
    }
}

fn correlacao_path(filtro_objeto: Option<&str>) -> String {
    let path = Endpoint::AnaliseCorrelacao.path();
    match filtro_objeto.filter(|objeto| !objeto.trim().is_empty()) {
        Some(objeto) => with_param(path, "filtro_objeto", objeto),
        None => path.to_string(),
    }
}

fn with_param(path: &str, key: &str, value: &str) -> String {
    let encoded: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair(key, value)
        .finish();
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}{encoded}")
}

/// FastAPI puts its message under `detail`.
fn server_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["detail", "message", "error"]
        .iter()
        .find_map(|key| value.get(*key))
        .map(|detail| match detail {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
}
