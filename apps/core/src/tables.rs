use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use serde::Serialize;

use crate::domain::{CasoCritico, ClienteReincidente, ObjetoYearRow, SaldoPorObjeto, SaldoRow};
use crate::format::{format_currency, format_number};
use crate::surface::Surface;

pub const NO_DATA: &str = "Nenhum dado disponível";
pub const NO_MATCH: &str = "Nenhum resultado encontrado";

pub const TABLE_ENTRADAS: &str = "table-entradas";
pub const TABLE_ENCERRADOS: &str = "table-encerrados";
pub const TABLE_SALDO: &str = "table-saldo";
pub const TABLE_REINCIDENCIA: &str = "table-reincidencia";
pub const TABLE_CASOS_CRITICOS: &str = "table-casos-criticos";
pub const MIRROR_INFO: &str = "encerrados-espelho-info";
pub const MIRROR_TEXT: &str = "encerrados-espelho-texto";

pub const ENTRADAS_YEARS: [u16; 4] = [2022, 2023, 2024, 2025];
pub const ENCERRADOS_YEARS: [u16; 3] = [2023, 2024, 2025];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub text: String,
    pub class: Option<String>,
    pub clickable: bool,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_class(mut self, class: &str) -> Self {
        if !class.is_empty() {
            self.class = Some(class.to_string());
        }
        self
    }

    #[must_use]
    pub const fn clickable(mut self) -> Self {
        self.clickable = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub cells: Vec<Cell>,
    pub class: Option<String>,
    /// Row identity for click handling (`data-objeto`).
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
    /// Shown as a single full-width row instead of `rows`.
    pub message: Option<String>,
}

impl TableView {
    pub fn message(headers: Vec<String>, message: &str) -> Self {
        Self {
            headers,
            rows: Vec::new(),
            message: Some(message.to_string()),
        }
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn first_column(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter_map(|row| row.cells.first())
            .map(|cell| cell.text.as_str())
            .collect()
    }
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

/// Click-to-sort state: a new column starts ascending, the same column flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState<C> {
    pub column: Option<C>,
    pub ascending: bool,
}

impl<C> Default for SortState<C> {
    fn default() -> Self {
        Self {
            column: None,
            ascending: true,
        }
    }
}

impl<C: Copy + PartialEq> SortState<C> {
    pub fn toggle(&mut self, column: C) {
        self.ascending = if self.column == Some(column) {
            !self.ascending
        } else {
            true
        };
        self.column = Some(column);
    }

    fn apply(&self, ordering: Ordering) -> Ordering {
        if self.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

fn compare_number(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}

fn within(value: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.is_none_or(|min| value >= min) && max.is_none_or(|max| value <= max)
}

fn saldo_class(value: f64) -> &'static str {
    if value < 0.0 {
        "saldo-negativo"
    } else if value > 0.0 {
        "saldo-positivo"
    } else {
        ""
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntradasColumn {
    Objeto,
    Year(u16),
    Total,
}

impl EntradasColumn {
    /// Parses a header's `data-col`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "objeto" => Some(Self::Objeto),
            "total" => Some(Self::Total),
            year => year.parse().ok().map(Self::Year),
        }
    }
}

fn year_headers(first: &str, years: &[u16]) -> Vec<String> {
    std::iter::once(first.to_string())
        .chain(years.iter().map(u16::to_string))
        .chain(std::iter::once("Total".to_string()))
        .collect()
}

fn year_row(row: &ObjetoYearRow, years: &[u16], clickable: bool) -> TableRow {
    let mark = |cell: Cell| if clickable { cell.clickable() } else { cell };
    let cells = std::iter::once(mark(Cell::text(row.name())))
        .chain(
            years
                .iter()
                .map(|year| mark(Cell::text(format_number(row.year(*year))))),
        )
        .chain(std::iter::once(mark(Cell::text(format_number(row.total(years))))))
        .collect();
    TableRow {
        cells,
        class: None,
        key: Some(row.name().to_string()),
    }
}

pub fn entradas_table(rows: &[ObjetoYearRow], sort: &SortState<EntradasColumn>) -> TableView {
    let headers = year_headers("Objeto", &ENTRADAS_YEARS);
    if rows.is_empty() {
        return TableView::message(headers, NO_DATA);
    }

    let mut sorted: Vec<&ObjetoYearRow> = rows.iter().collect();
    if let Some(column) = sort.column {
        sorted.sort_by(|a, b| {
            let ordering = match column {
                EntradasColumn::Objeto => compare_text(a.name(), b.name()),
                EntradasColumn::Year(year) => compare_number(a.year(year), b.year(year)),
                EntradasColumn::Total => {
                    compare_number(a.total(&ENTRADAS_YEARS), b.total(&ENTRADAS_YEARS))
                }
            };
            sort.apply(ordering)
        });
    }

    TableView {
        headers,
        rows: sorted
            .into_iter()
            .map(|row| year_row(row, &ENTRADAS_YEARS, true))
            .collect(),
        message: None,
    }
}

/// All closures, or only `objeto` (a zero row when it has none).
pub fn encerrados_table(rows: &[ObjetoYearRow], objeto: Option<&str>) -> TableView {
    let headers = year_headers("Objeto", &ENCERRADOS_YEARS);

    let shown: Vec<ObjetoYearRow> = match objeto {
        Some(objeto) => vec![rows
            .iter()
            .find(|row| row.name() == objeto)
            .cloned()
            .unwrap_or_else(|| ObjetoYearRow::placeholder(objeto))],
        None => rows.to_vec(),
    };

    if shown.is_empty() {
        return TableView::message(headers, NO_DATA);
    }

    TableView {
        headers,
        rows: shown
            .iter()
            .map(|row| year_row(row, &ENCERRADOS_YEARS, false))
            .collect(),
        message: None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaldoColumn {
    Objeto,
    Entradas,
    Encerramentos,
    Saldo,
}

impl SaldoColumn {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "objeto" => Some(Self::Objeto),
            "entradas" => Some(Self::Entradas),
            "encerramentos" => Some(Self::Encerramentos),
            "saldo" => Some(Self::Saldo),
            _ => None,
        }
    }

    fn value(self, row: &SaldoRow) -> f64 {
        match self {
            Self::Objeto => 0.0,
            Self::Entradas => row.qtd_entradas,
            Self::Encerramentos => row.qtd_encerramentos,
            Self::Saldo => row.saldo,
        }
    }
}

/// Per-objeto balance with a trailing `TOTAL` row.
pub fn saldo_table(data: &SaldoPorObjeto, sort: &SortState<SaldoColumn>) -> TableView {
    let headers = headers(&["Objeto", "Entradas", "Encerramentos", "Saldo"]);
    if data.dados.is_empty() {
        return TableView::message(headers, NO_DATA);
    }

    let mut sorted: Vec<&SaldoRow> = data.dados.iter().collect();
    if let Some(column) = sort.column {
        sorted.sort_by(|a, b| {
            let ordering = match column {
                SaldoColumn::Objeto => compare_text(a.objeto(), b.objeto()),
                numeric => compare_number(numeric.value(a), numeric.value(b)),
            };
            sort.apply(ordering)
        });
    }

    let mut rows: Vec<TableRow> = sorted
        .into_iter()
        .map(|row| TableRow {
            cells: vec![
                Cell::text(row.objeto()),
                Cell::text(format_number(row.qtd_entradas)),
                Cell::text(format_number(row.qtd_encerramentos)),
                Cell::text(format_number(row.saldo)).with_class(saldo_class(row.saldo)),
            ],
            class: None,
            key: Some(row.objeto().to_string()),
        })
        .collect();

    rows.push(TableRow {
        cells: vec![
            Cell::text("TOTAL"),
            Cell::text(format_number(data.total_entradas)),
            Cell::text(format_number(data.total_encerramentos)),
            Cell::text(format_number(data.total_saldo)).with_class(saldo_class(data.total_saldo)),
        ],
        class: Some("total-row".to_string()),
        key: None,
    });

    TableView {
        headers,
        rows,
        message: None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReincidenciaColumn {
    Nome,
    Processos,
    Resultado,
}

impl ReincidenciaColumn {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "nome_cliente" | "nome" => Some(Self::Nome),
            "qtd_processos" => Some(Self::Processos),
            "resultado" => Some(Self::Resultado),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReincidenciaFilter {
    pub nome: String,
    pub qtd_min: Option<f64>,
    pub qtd_max: Option<f64>,
    pub resultado_min: Option<f64>,
    pub resultado_max: Option<f64>,
}

impl ReincidenciaFilter {
    fn matches(&self, row: &ClienteReincidente) -> bool {
        contains_ignore_case(row.nome_cliente.as_deref().unwrap_or_default(), &self.nome)
            && within(row.qtd_processos, self.qtd_min, self.qtd_max)
            && within(row.resultado, self.resultado_min, self.resultado_max)
    }
}

pub fn reincidencia_table(
    rows: &[ClienteReincidente],
    filter: &ReincidenciaFilter,
    sort: &SortState<ReincidenciaColumn>,
) -> TableView {
    let headers = headers(&["Cliente", "Processos", "Resultado"]);
    if rows.is_empty() {
        return TableView::message(headers, NO_DATA);
    }

    let mut kept: Vec<&ClienteReincidente> =
        rows.iter().filter(|row| filter.matches(row)).collect();
    if kept.is_empty() {
        return TableView::message(headers, NO_MATCH);
    }

    if let Some(column) = sort.column {
        kept.sort_by(|a, b| {
            let ordering = match column {
                ReincidenciaColumn::Nome => compare_text(
                    a.nome_cliente.as_deref().unwrap_or_default(),
                    b.nome_cliente.as_deref().unwrap_or_default(),
                ),
                ReincidenciaColumn::Processos => compare_number(a.qtd_processos, b.qtd_processos),
                ReincidenciaColumn::Resultado => compare_number(a.resultado, b.resultado),
            };
            sort.apply(ordering)
        });
    }

    TableView {
        headers,
        rows: kept
            .into_iter()
            .map(|row| TableRow {
                cells: vec![
                    Cell::text(row.nome_cliente.as_deref().unwrap_or("N/A")),
                    Cell::text(format_number(row.qtd_processos)),
                    Cell::text(format_currency(row.resultado)),
                ],
                class: None,
                key: row.nome_cliente.clone(),
            })
            .collect(),
        message: None,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CasosCriticosFilter {
    pub nome: String,
    pub tipo: String,
    pub motivo: String,
    pub situacao: String,
    pub prejuizo_min: Option<f64>,
    pub prejuizo_max: Option<f64>,
}

impl CasosCriticosFilter {
    fn matches(&self, row: &CasoCritico) -> bool {
        let text = |value: &Option<String>| value.as_deref().unwrap_or_default().to_string();
        contains_ignore_case(&text(&row.nome_cliente), &self.nome)
            && contains_ignore_case(&text(&row.tipo_ocorrencia), &self.tipo)
            && contains_ignore_case(&text(&row.motivo_detalhado), &self.motivo)
            && contains_ignore_case(&text(&row.situacao), &self.situacao)
            && within(row.prejuizo, self.prejuizo_min, self.prejuizo_max)
    }
}

pub fn casos_criticos_table(rows: &[CasoCritico], filter: &CasosCriticosFilter) -> TableView {
    let headers = headers(&[
        "Nome",
        "Tipo de Ocorrência",
        "Motivo",
        "Situação",
        "Prejuízo",
        "Valor Pretendido",
        "Ano",
    ]);
    if rows.is_empty() {
        return TableView::message(headers, NO_DATA);
    }

    let kept: Vec<&CasoCritico> = rows.iter().filter(|row| filter.matches(row)).collect();
    if kept.is_empty() {
        return TableView::message(headers, NO_MATCH);
    }

    let or_na = |value: &Option<String>| value.clone().unwrap_or_else(|| "N/A".to_string());
    TableView {
        headers,
        rows: kept
            .into_iter()
            .map(|row| TableRow {
                cells: vec![
                    Cell::text(or_na(&row.nome_cliente)),
                    Cell::text(or_na(&row.tipo_ocorrencia)),
                    Cell::text(or_na(&row.motivo_detalhado)),
                    Cell::text(or_na(&row.situacao)),
                    Cell::text(format_currency(row.prejuizo)),
                    Cell::text(format_currency(
                        row.valor_pretendido
                            .filter(|value| *value != 0.0)
                            .unwrap_or(row.prejuizo),
                    )),
                    Cell::text(
                        row.ano
                            .map_or_else(|| "N/A".to_string(), |year| format!("{year:.0}")),
                    ),
                ],
                class: None,
                key: None,
            })
            .collect(),
        message: None,
    }
}

#[derive(Default)]
struct TablesState {
    entradas: Vec<ObjetoYearRow>,
    entradas_sort: SortState<EntradasColumn>,
    encerrados: Vec<ObjetoYearRow>,
    mirrored: Option<String>,
    saldo: SaldoPorObjeto,
    saldo_sort: SortState<SaldoColumn>,
    reincidencia: Vec<ClienteReincidente>,
    reincidencia_filter: ReincidenciaFilter,
    reincidencia_sort: SortState<ReincidenciaColumn>,
    casos: Vec<CasoCritico>,
    casos_filter: CasosCriticosFilter,
}

/// Owns the loaded table data so sorting and filtering re-render without
/// another request.
pub struct TablesController {
    surface: Rc<dyn Surface>,
    state: RefCell<TablesState>,
}

impl TablesController {
    pub fn new(surface: Rc<dyn Surface>) -> Self {
        Self {
            surface,
            state: RefCell::new(TablesState::default()),
        }
    }

    pub fn show_error(&self, table: &str, message: &str) {
        self.surface
            .render_table(table, &TableView::message(Vec::new(), message));
    }

    pub fn set_entradas(&self, rows: Vec<ObjetoYearRow>) {
        self.state.borrow_mut().entradas = rows;
        self.render_entradas();
    }

    pub fn sort_entradas(&self, column: EntradasColumn) {
        self.state.borrow_mut().entradas_sort.toggle(column);
        self.render_entradas();
    }

    fn render_entradas(&self) {
        let view = {
            let state = self.state.borrow();
            entradas_table(&state.entradas, &state.entradas_sort)
        };
        self.surface.render_table(TABLE_ENTRADAS, &view);
    }

    pub fn set_encerrados(&self, rows: Vec<ObjetoYearRow>) {
        self.state.borrow_mut().encerrados = rows;
        self.render_encerrados();
    }

    /// Shows only `objeto` in the encerrados table, or everything for `None`.
    pub fn mirror(&self, objeto: Option<&str>) {
        self.state.borrow_mut().mirrored = objeto.map(str::to_string);
        self.render_encerrados();

        match objeto {
            Some(objeto) => {
                self.surface.set_visible(MIRROR_INFO, true);
                self.surface
                    .set_text(MIRROR_TEXT, &format!("Espelhando: {objeto}"));
            }
            None => self.surface.set_visible(MIRROR_INFO, false),
        }
    }

    pub fn mirrored(&self) -> Option<String> {
        self.state.borrow().mirrored.clone()
    }

    fn render_encerrados(&self) {
        let view = {
            let state = self.state.borrow();
            encerrados_table(&state.encerrados, state.mirrored.as_deref())
        };
        self.surface.render_table(TABLE_ENCERRADOS, &view);
    }

    pub fn set_saldo(&self, data: SaldoPorObjeto) {
        self.state.borrow_mut().saldo = data;
        self.render_saldo();
    }

    pub fn sort_saldo(&self, column: SaldoColumn) {
        self.state.borrow_mut().saldo_sort.toggle(column);
        self.render_saldo();
    }

    fn render_saldo(&self) {
        let view = {
            let state = self.state.borrow();
            saldo_table(&state.saldo, &state.saldo_sort)
        };
        self.surface.render_table(TABLE_SALDO, &view);
    }

    pub fn set_reincidencia(&self, rows: Vec<ClienteReincidente>) {
        self.state.borrow_mut().reincidencia = rows;
        self.render_reincidencia();
    }

    pub fn sort_reincidencia(&self, column: ReincidenciaColumn) {
        self.state.borrow_mut().reincidencia_sort.toggle(column);
        self.render_reincidencia();
    }

    pub fn filter_reincidencia(&self, filter: ReincidenciaFilter) {
        self.state.borrow_mut().reincidencia_filter = filter;
        self.render_reincidencia();
    }

    fn render_reincidencia(&self) {
        let view = {
            let state = self.state.borrow();
            reincidencia_table(
                &state.reincidencia,
                &state.reincidencia_filter,
                &state.reincidencia_sort,
            )
        };
        self.surface.render_table(TABLE_REINCIDENCIA, &view);
    }

    pub fn set_casos_criticos(&self, rows: Vec<CasoCritico>) {
        self.state.borrow_mut().casos = rows;
        self.render_casos();
    }

    pub fn filter_casos_criticos(&self, filter: CasosCriticosFilter) {
        self.state.borrow_mut().casos_filter = filter;
        self.render_casos();
    }

    fn render_casos(&self) {
        let view = {
            let state = self.state.borrow();
            casos_criticos_table(&state.casos, &state.casos_filter)
        };
        self.surface.render_table(TABLE_CASOS_CRITICOS, &view);
    }
}
