//! Response payloads of the analytics backend.
//!
//! Aggregation happens server-side; these types only carry the figures. The
//! backend occasionally sends `null`, strings or omits numeric fields, so every
//! figure goes through [`lenient`] and defaults to zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn number_of(value: &Value) -> Option<f64> {
        match value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse().ok(),
            Value::Bool(flag) => Some(f64::from(u8::from(*flag))),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(number_of).unwrap_or(0.0))
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(number_of))
    }

    /// Text fields that sometimes arrive as numbers.
    pub fn opt_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(text)) if !text.trim().is_empty() => Some(text),
            Some(Value::Number(number)) => Some(number.to_string()),
            _ => None,
        })
    }
}

const NOT_INFORMED: &str = "Não Informado";
const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpisFinais {
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total_casos: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total_impacto: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub media_impacto: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub casos_criticos: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub taxa_encerramento: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstatisticasGerais {
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total_acoes: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total_encerramentos: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub media_valor_causa: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub media_pagamento: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub impacto_negativo_global: f64,
}

/// `/saldo/`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaldoResumo {
    #[serde(default, deserialize_with = "lenient::f64")]
    pub entradas: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub encerrados: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub saldo: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub impacto_entradas: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub impacto_encerrados: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub saldo_impacto: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaldoRow {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub objeto_acao: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub qtd_entradas: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub qtd_encerramentos: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub saldo: f64,
}

impl SaldoRow {
    pub fn objeto(&self) -> &str {
        self.objeto_acao.as_deref().unwrap_or(NOT_INFORMED)
    }
}

/// `/saldo/por-objeto`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaldoPorObjeto {
    #[serde(default)]
    pub dados: Vec<SaldoRow>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total_entradas: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total_encerramentos: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total_saldo: f64,
}

/// One row of the entradas/encerrados tables: an objeto and one count per year
/// column (`"2022"`, `"2023"`, ..., `"Total"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjetoYearRow {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub objeto_acao: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub objeto: Option<String>,
    #[serde(flatten)]
    pub columns: BTreeMap<String, Value>,
}

impl ObjetoYearRow {
    pub fn name(&self) -> &str {
        self.objeto_acao
            .as_deref()
            .or(self.objeto.as_deref())
            .unwrap_or(NOT_AVAILABLE)
    }

    pub fn year(&self, year: u16) -> f64 {
        let key = year.to_string();
        self.columns
            .get(&key)
            .or_else(|| self.columns.get(&format!("{key}.0")))
            .and_then(lenient::number_of)
            .unwrap_or(0.0)
    }

    /// The `Total` column, or the sum of `years` when absent.
    pub fn total(&self, years: &[u16]) -> f64 {
        self.columns
            .get("Total")
            .or_else(|| self.columns.get("total"))
            .and_then(lenient::number_of)
            .unwrap_or_else(|| years.iter().map(|year| self.year(*year)).sum())
    }

    pub fn placeholder(objeto: &str) -> Self {
        Self {
            objeto_acao: Some(objeto.to_string()),
            ..Self::default()
        }
    }
}

/// `/entradas/por-objeto`, `/encerramentos/por-objeto`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PorObjeto {
    #[serde(default)]
    pub dados: Vec<ObjetoYearRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvolucaoPoint {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub periodo: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub entradas: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub encerramentos: f64,
}

/// `/indicadores/evolucao`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evolucao {
    #[serde(default)]
    pub dados: Vec<EvolucaoPoint>,
}

impl Evolucao {
    /// Points in chronological order (`YYYY-MM` periods sort lexically).
    pub fn sorted(&self) -> Vec<EvolucaoPoint> {
        let mut points = self.dados.clone();
        points.sort_by(|a, b| {
            a.periodo
                .as_deref()
                .unwrap_or_default()
                .cmp(b.periodo.as_deref().unwrap_or_default())
        });
        points
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstadoResumo {
    #[serde(default)]
    pub estado: String,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub quantidade: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub impacto_total: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub tempo_medio: f64,
}

/// `/mapas/nacional`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapaNacional {
    #[serde(default)]
    pub estados: Vec<EstadoResumo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Capital {
    pub uf: String,
    #[serde(default)]
    pub capital: String,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub lat: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub lon: f64,
}

/// `/mapas/capitais`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Capitais {
    #[serde(default)]
    pub capitais: Vec<Capital>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cidade {
    pub cidade: String,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub quantidade: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub impacto_total: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub lat: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub lon: f64,
}

/// `/mapas/cidades-por-uf`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cidades {
    #[serde(default)]
    pub cidades: Vec<Cidade>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TempoPorObjeto {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub objeto: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub tempo_medio: f64,
}

/// `/indicadores/tempo-medio`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TempoMedio {
    #[serde(default, deserialize_with = "lenient::f64")]
    pub media_geral: f64,
    #[serde(default)]
    pub por_objeto: Vec<TempoPorObjeto>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReiteracaoPorObjeto {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub objeto: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total_reiteracoes: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub quantidade: f64,
}

/// `/indicadores/reiteracoes`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reiteracoes {
    #[serde(default)]
    pub dados: Vec<ReiteracaoPorObjeto>,
}

/// `/indicadores/reincidencia`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reincidencia {
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub reincidentes: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub taxa_reincidencia: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClienteReincidente {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub nome_cliente: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub qtd_processos: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub resultado: f64,
}

/// `/indicadores/reincidencia-por-cliente`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReincidenciaPorCliente {
    #[serde(default)]
    pub dados: Vec<ClienteReincidente>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub taxa_reincidencia: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CasoCritico {
    #[serde(default, alias = "cliente", deserialize_with = "lenient::opt_string")]
    pub nome_cliente: Option<String>,
    #[serde(default, alias = "objeto_acao", deserialize_with = "lenient::opt_string")]
    pub tipo_ocorrencia: Option<String>,
    #[serde(
        default,
        alias = "motivo_encerramento",
        deserialize_with = "lenient::opt_string"
    )]
    pub motivo_detalhado: Option<String>,
    #[serde(default, alias = "status", deserialize_with = "lenient::opt_string")]
    pub situacao: Option<String>,
    #[serde(
        default,
        alias = "impacto_financeiro",
        deserialize_with = "lenient::f64"
    )]
    pub prejuizo: f64,
    #[serde(default, alias = "valor_causa", deserialize_with = "lenient::opt_f64")]
    pub valor_pretendido: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub ano: Option<f64>,
}

/// `/indicadores/casos-criticos`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CasosCriticos {
    #[serde(default)]
    pub dados: Vec<CasoCritico>,
}

/// Donut input: one UF's share of the cases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UfShare {
    pub uf: String,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub quantidade: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub prejuizo_total: f64,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub prejuizo_total_mil: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub percentual: f64,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub impacto_mil: Option<f64>,
}

impl UfShare {
    /// Loss in thousands of reais.
    pub fn prejuizo_mil(&self) -> f64 {
        self.prejuizo_total_mil
            .or(self.impacto_mil)
            .unwrap_or(self.prejuizo_total / 1000.0)
    }
}

/// `/indicadores/analise-correlacao`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnaliseCorrelacao {
    #[serde(default)]
    pub mapa: MapaNacional,
    #[serde(default)]
    pub distribuicao_uf: Vec<UfShare>,
    #[serde(default)]
    pub filtro_objeto: Option<String>,
}

/// Pivot row of `/indicadores/objeto-por-estado`: a UF and one count per objeto.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstadoObjetos {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub estado: Option<String>,
    #[serde(flatten)]
    pub objetos: BTreeMap<String, Value>,
}

impl EstadoObjetos {
    pub fn count(&self, objeto: &str) -> f64 {
        self.objetos
            .get(objeto)
            .and_then(lenient::number_of)
            .unwrap_or(0.0)
    }
}

/// `/indicadores/objeto-por-estado`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjetoPorEstado {
    #[serde(default)]
    pub dados: Vec<EstadoObjetos>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactoPorObjeto {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub objeto: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub quantidade: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub impacto_medio: f64,
}

/// `/indicadores/casos-impacto`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CasosImpacto {
    #[serde(default)]
    pub dados: Vec<ImpactoPorObjeto>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlaPorArea {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub area: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub media_dias: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub quantidade: f64,
    #[serde(default)]
    pub acima_da_meta: bool,
}

/// `/indicadores/sla-area`; the benchmark is the national cut-off line in days.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlaArea {
    #[serde(default)]
    pub dados: Vec<SlaPorArea>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub benchmark_nacional: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubsidioPorArea {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub area: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub tempo_medio_tramitacao: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub quantidade: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub percentual_dentro_sla: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub percentual_acima_5_dias: f64,
}

/// `/indicadores/sla-subsidio-por-area`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlaSubsidioPorArea {
    #[serde(default)]
    pub dados: Vec<SubsidioPorArea>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub media_nacional_sla: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub media_nacional_tempo: f64,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub sla_dias: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub legenda: Option<String>,
}

/// `/indicadores/areas-responsaveis`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AreasResponsaveis {
    #[serde(default)]
    pub areas: Vec<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total: f64,
}

/// Cases on one side of the five-day deadline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrazoGrupo {
    #[serde(default)]
    pub prazo_maior_5: bool,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub data_entrada: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub impacto_financeiro: f64,
}

/// `/indicadores/solicitacoes-prazo`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolicitacoesPrazo {
    #[serde(default)]
    pub dados: Vec<PrazoGrupo>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total_maior_5: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrazoPorArea {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub area: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub menor_igual_5: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub maior_5: f64,
}

/// `/indicadores/solicitacoes-prazo-por-area`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolicitacoesPrazoPorArea {
    #[serde(default)]
    pub dados: Vec<PrazoPorArea>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UfCasos {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub uf: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub objeto: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub quantidade: f64,
}

/// `/indicadores/casos-objetos-por-uf`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CasosObjetosPorUf {
    #[serde(default)]
    pub por_uf: Vec<UfCasos>,
    #[serde(default)]
    pub por_objeto_uf: Vec<UfCasos>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total_casos: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total_ufs: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustoEncerramento {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub tipo_encerramento: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub volume: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub custo_total: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub custo_medio: f64,
}

/// `/indicadores/volume-custo`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeCusto {
    #[serde(default)]
    pub dados: Vec<CustoEncerramento>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total_volume: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total_custo: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParetoPoint {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub objeto_acao: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub impacto_financeiro: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub acumulado: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub percentual: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub percentual_acumulado: f64,
}

/// `/indicadores/pareto`, largest impact first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pareto {
    #[serde(default)]
    pub dados: Vec<ParetoPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentencaPercentuais {
    #[serde(default, deserialize_with = "lenient::f64")]
    pub favoravel: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub desfavoravel: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub parcial: f64,
}

/// `/indicadores/sentencas`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sentencas {
    #[serde(default, deserialize_with = "lenient::f64")]
    pub favoravel: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub desfavoravel: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub parcial: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total: f64,
    #[serde(default)]
    pub percentuais: SentencaPercentuais,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentencasArea {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub area: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub favoravel: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub desfavoravel: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub parcial: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total: f64,
}

/// `/indicadores/sentencas-por-area`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentencasPorArea {
    #[serde(default)]
    pub dados: Vec<SentencasArea>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TipoAcao {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub tipo: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub quantidade: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub impacto: f64,
}

/// `/indicadores/tipos-acoes-2025`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TiposAcoes {
    #[serde(default)]
    pub dados: Vec<TipoAcao>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErroPorObjeto {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub objeto: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub quantidade: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub impacto: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub valor_pretendido: f64,
}

/// `/indicadores/erro-sistemico`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErroSistemico {
    #[serde(default)]
    pub dados: Vec<ErroPorObjeto>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total_erros: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total_impacto: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total_valor_pretendido: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoReiterado {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub objeto_acao: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub reiteracoes: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub impacto_financeiro: f64,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub estado: Option<String>,
}

/// `/indicadores/maior-reiteracao`, the twenty most reiterated cases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaiorReiteracao {
    #[serde(default)]
    pub dados: Vec<AutoReiterado>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Desfecho {
    #[serde(default, deserialize_with = "lenient::f64")]
    pub quantidade: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub percentual: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub valor_pretendido_total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcordoDetalhe {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub numero_processo: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub nome_cliente: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub valor_pretendido: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub valor_acordo: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub economia: f64,
}

/// Settlements reached before a sentence, with what each one saved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcordoAntesSentenca {
    #[serde(default, deserialize_with = "lenient::f64")]
    pub quantidade: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub percentual: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub valor_pretendido_total: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub valor_acordo_total: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub economia_total: f64,
    #[serde(default)]
    pub detalhes: Vec<AcordoDetalhe>,
}

/// `/indicadores/acoes-ganhas-perdidas`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcoesGanhasPerdidas {
    #[serde(default)]
    pub ganhas: Desfecho,
    #[serde(default)]
    pub perdidas: Desfecho,
    #[serde(default)]
    pub acordo_antes_sentenca: AcordoAntesSentenca,
    #[serde(default)]
    pub em_tramite: Desfecho,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total_encerrados: f64,
}
