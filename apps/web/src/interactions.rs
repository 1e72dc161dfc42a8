use std::rc::Rc;

use painel_core::tables::{
    CasosCriticosFilter, EntradasColumn, ReincidenciaColumn, ReincidenciaFilter, SaldoColumn,
    TABLE_ENTRADAS, TABLE_REINCIDENCIA, TABLE_SALDO,
};
use painel_core::DashboardContext;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, HtmlInputElement};

pub const BTN_ENCERRADOS_VER_TODOS: &str = "btn-encerrados-ver-todos";
pub const BTN_IMPACTO_VER_TODOS: &str = "btn-impacto-ver-todos";
pub const BTN_LIMPAR_REINCIDENCIA: &str = "btn-limpar-filtros-reincidencia";

const REINCIDENCIA_INPUTS: [&str; 5] = [
    "filter-nome-reincidencia",
    "filter-qtd-min",
    "filter-qtd-max",
    "filter-resultado-min",
    "filter-resultado-max",
];

const CRITICOS_INPUTS: [&str; 6] = [
    "filter-nome-criticos",
    "filter-tipo-criticos",
    "filter-motivo-criticos",
    "filter-situacao-criticos",
    "filter-prejuizo-min-criticos",
    "filter-prejuizo-max-criticos",
];

/// What was under the pointer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClickTarget {
    /// `data-table` and `data-col` of a sortable header.
    pub sort: Option<(String, String)>,
    /// Table body id and `data-objeto` of a clickable cell's row.
    pub row: Option<(String, String)>,
    pub button: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SortEntradas(EntradasColumn),
    SortSaldo(SaldoColumn),
    SortReincidencia(ReincidenciaColumn),
    MirrorObjeto(String),
    SelectObjeto(String),
    ShowAllEncerrados,
    ShowAllObjetos,
    ClearReincidenciaFilters,
}

pub fn route(target: &ClickTarget) -> Option<Action> {
    if let Some((table, column)) = &target.sort {
        return match table.as_str() {
            TABLE_ENTRADAS => EntradasColumn::from_key(column).map(Action::SortEntradas),
            TABLE_SALDO => SaldoColumn::from_key(column).map(Action::SortSaldo),
            TABLE_REINCIDENCIA => {
                ReincidenciaColumn::from_key(column).map(Action::SortReincidencia)
            }
            _ => None,
        };
    }

    if let Some((table, objeto)) = &target.row {
        return match table.as_str() {
            TABLE_ENTRADAS => Some(Action::MirrorObjeto(objeto.clone())),
            TABLE_SALDO => Some(Action::SelectObjeto(objeto.clone())),
            _ => None,
        };
    }

    match target.button.as_deref()? {
        BTN_ENCERRADOS_VER_TODOS => Some(Action::ShowAllEncerrados),
        BTN_IMPACTO_VER_TODOS => Some(Action::ShowAllObjetos),
        BTN_LIMPAR_REINCIDENCIA => Some(Action::ClearReincidenciaFilters),
        _ => None,
    }
}

pub fn apply(context: &DashboardContext, action: Action) {
    tracing::debug!(?action, "table interaction");
    let tables = context.tables();
    match action {
        Action::SortEntradas(column) => tables.sort_entradas(column),
        Action::SortSaldo(column) => tables.sort_saldo(column),
        Action::SortReincidencia(column) => tables.sort_reincidencia(column),
        Action::MirrorObjeto(objeto) => tables.mirror(Some(&objeto)),
        Action::SelectObjeto(objeto) => {
            context.cross_filter().select_objeto(&objeto);
        }
        Action::ShowAllEncerrados => tables.mirror(None),
        Action::ShowAllObjetos => context.cross_filter().show_all_objetos(),
        Action::ClearReincidenciaFilters => {
            for id in REINCIDENCIA_INPUTS {
                if let Some(input) = input(id) {
                    input.set_value("");
                }
            }
            tables.filter_reincidencia(ReincidenciaFilter::default());
        }
    }
}

/// Empty or non-numeric input means no bound.
pub fn bound(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    value.parse::<f64>().ok().filter(|value| value.is_finite())
}

pub fn reincidencia_filter(value: impl Fn(&str) -> String) -> ReincidenciaFilter {
    ReincidenciaFilter {
        nome: value("filter-nome-reincidencia"),
        qtd_min: bound(&value("filter-qtd-min")),
        qtd_max: bound(&value("filter-qtd-max")),
        resultado_min: bound(&value("filter-resultado-min")),
        resultado_max: bound(&value("filter-resultado-max")),
    }
}

pub fn casos_criticos_filter(value: impl Fn(&str) -> String) -> CasosCriticosFilter {
    CasosCriticosFilter {
        nome: value("filter-nome-criticos"),
        tipo: value("filter-tipo-criticos"),
        motivo: value("filter-motivo-criticos"),
        situacao: value("filter-situacao-criticos"),
        prejuizo_min: bound(&value("filter-prejuizo-min-criticos")),
        prejuizo_max: bound(&value("filter-prejuizo-max-criticos")),
    }
}

fn input(id: &str) -> Option<HtmlInputElement> {
    web_sys::window()?
        .document()?
        .get_element_by_id(id)?
        .dyn_into()
        .ok()
}

fn input_value(id: &str) -> String {
    input(id).map(|input| input.value()).unwrap_or_default()
}

fn closest(element: &Element, selector: &str) -> Option<Element> {
    element.closest(selector).ok().flatten()
}

fn click_target(element: &Element) -> ClickTarget {
    let sort = closest(element, "th.sortable").and_then(|th| {
        Some((th.get_attribute("data-table")?, th.get_attribute("data-col")?))
    });
    let row = closest(element, "td.clickable").and_then(|cell| {
        let objeto = closest(&cell, "tr[data-objeto]")?.get_attribute("data-objeto")?;
        let table = closest(&cell, "tbody[id]")?.id();
        Some((table, objeto))
    });
    let button = closest(element, "button[id]").map(|button| button.id());
    ClickTarget { sort, row, button }
}

fn target_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

/// Installs the document-level listeners. They live as long as the page.
pub fn bind(context: &Rc<DashboardContext>) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let on_click = {
        let context = Rc::clone(context);
        Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let Some(element) = target_element(&event) else {
                return;
            };
            if let Some(action) = route(&click_target(&element)) {
                apply(&context, action);
            }
        })
    };
    document.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();

    let on_input = {
        let context = Rc::clone(context);
        Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let Some(id) = target_element(&event).map(|element| element.id()) else {
                return;
            };
            if REINCIDENCIA_INPUTS.contains(&id.as_str()) {
                context
                    .tables()
                    .filter_reincidencia(reincidencia_filter(input_value));
            } else if CRITICOS_INPUTS.contains(&id.as_str()) {
                context
                    .tables()
                    .filter_casos_criticos(casos_criticos_filter(input_value));
            }
        })
    };
    document.add_event_listener_with_callback("input", on_input.as_ref().unchecked_ref())?;
    on_input.forget();

    Ok(())
}
