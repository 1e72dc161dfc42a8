use std::cell::RefCell;
use std::rc::Rc;

use color_eyre::eyre::{eyre, Result};
use painel_core::api::{ApiClient, Endpoint};
use painel_core::config::ApiConfig;
use painel_core::context::Collaborators;
use painel_core::domain::{EstatisticasGerais, KpisFinais, SaldoResumo};
use painel_core::format::{format_currency, format_number, format_percent};
use painel_core::scheduler::TokioScheduler;
use painel_core::{DashboardContext, FilterKind, FilterStore};
use serde::Serialize;
use tokio::task::LocalSet;
use tokio::time::Instant;

use crate::headless::{Drawing, HeadlessProbe, TextBackend, TextMaps, TextSurface};
use crate::report::render_report;
use crate::transport::ReqwestTransport;

#[derive(Debug, Serialize)]
pub struct Summary {
    pub kpis: KpisFinais,
    pub estatisticas: EstatisticasGerais,
    pub saldo: SaldoResumo,
}

fn client(config: ApiConfig) -> Result<ApiClient> {
    let transport = ReqwestTransport::new()?;
    Ok(ApiClient::new(Rc::new(transport), config, FilterStore::new()))
}

async fn fetch_summary(api: &ApiClient) -> Result<Summary> {
    let (kpis, estatisticas, saldo) = futures::try_join!(
        api.kpis_finais(),
        api.estatisticas_gerais(),
        api.saldo()
    )?;
    Ok(Summary {
        kpis,
        estatisticas,
        saldo,
    })
}

pub fn summary_text(summary: &Summary) -> String {
    let Summary {
        kpis,
        estatisticas,
        saldo,
    } = summary;
    let lines = [
        String::new(),
        "Painel".to_string(),
        "======".to_string(),
        format!("Total de casos: {}", format_number(kpis.total_casos)),
        format!("Impacto total: {}", format_currency(kpis.total_impacto)),
        format!("Impacto médio: {}", format_currency(kpis.media_impacto)),
        format!("Casos críticos: {}", format_number(kpis.casos_criticos)),
        format!(
            "Taxa de encerramento: {}",
            format_percent(kpis.taxa_encerramento)
        ),
        String::new(),
        "Estatísticas gerais:".to_string(),
        format!("- Ações: {}", format_number(estatisticas.total_acoes)),
        format!(
            "- Encerramentos: {}",
            format_number(estatisticas.total_encerramentos)
        ),
        format!(
            "- Valor médio da causa: {}",
            format_currency(estatisticas.media_valor_causa)
        ),
        format!(
            "- Pagamento médio: {}",
            format_currency(estatisticas.media_pagamento)
        ),
        String::new(),
        "Saldo:".to_string(),
        format!("- Entradas: {}", format_number(saldo.entradas)),
        format!("- Encerrados: {}", format_number(saldo.encerrados)),
        format!("- Saldo: {}", format_number(saldo.saldo)),
        format!("- Saldo de impacto: {}", format_currency(saldo.saldo_impacto)),
    ];
    lines.join("\n")
}

pub async fn summary(config: ApiConfig, json: bool) -> Result<()> {
    let api = client(config)?;
    let summary = fetch_summary(&api).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary_text(&summary));
    }
    Ok(())
}

pub async fn check(config: ApiConfig) -> Result<()> {
    let api = client(config)?;
    let mut failures = 0_usize;

    for endpoint in Endpoint::ALL {
        let started = Instant::now();
        let result = api.endpoint(endpoint).await;
        let elapsed = started.elapsed().as_millis();

        match result {
            Ok(_) => println!("ok    {elapsed:>5} ms  {}", endpoint.path()),
            Err(error) => {
                failures += 1;
                println!("FAIL  {elapsed:>5} ms  {}  ({error})", endpoint.path());
            }
        }
    }

    if failures > 0 {
        return Err(eyre!(
            "{failures} of {} endpoints failed",
            Endpoint::ALL.len()
        ));
    }
    println!("\nAll {} endpoints answered.", Endpoint::ALL.len());
    Ok(())
}

/// Loads every section with text backends and prints what was drawn.
pub async fn render(config: ApiConfig, uf: Option<String>, objeto: Option<String>) -> Result<()> {
    let transport = ReqwestTransport::new()?;
    let local = LocalSet::new();

    local
        .run_until(async move {
            let drawing = Rc::new(RefCell::new(Drawing::default()));
            let context = DashboardContext::new(
                Collaborators {
                    transport: Rc::new(transport),
                    probe: Rc::new(HeadlessProbe),
                    scheduler: Rc::new(TokioScheduler::default()),
                    renderer: Rc::new(TextBackend::new(Rc::clone(&drawing))),
                    maps: Rc::new(TextMaps::new(Rc::clone(&drawing))),
                    surface: Rc::new(TextSurface::new(Rc::clone(&drawing))),
                },
                config,
            );

            if let Some(uf) = uf {
                context
                    .filters()
                    .set_filter(FilterKind::Uf, Some(uf.to_uppercase()));
            }
            if objeto.is_some() {
                context.filters().set_filter(FilterKind::Objeto, objeto);
            }

            let mut outcomes = context.start().await;
            outcomes.extend(context.loader().scan().await);
            tracing::debug!(sections = outcomes.len(), "headless load finished");

            println!("{}", render_report(&outcomes, &drawing.borrow()));
            context.shutdown();
            Ok(())
        })
        .await
}
