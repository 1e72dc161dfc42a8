use std::cell::RefCell;
use std::rc::{Rc, Weak};

use futures::FutureExt;

use crate::api::{ApiClient, HttpTransport};
use crate::config::{ApiConfig, ObserverOptions, Timings};
use crate::cross_filter::CrossFilterCoordinator;
use crate::filters::{listener, FilterState, FilterStore, Listener};
use crate::handlers::{Section, SectionHandlers, SectionTask};
use crate::lifecycle::ChartLifecycleManager;
use crate::maps::{MapBackend, MapsController, RegionClick, MAP_IMPACTO, MAP_NACIONAL};
use crate::render::RenderBackend;
use crate::scheduler::Scheduler;
use crate::sections::{LoadOutcome, SectionLoader};
use crate::sequence::SequenceGate;
use crate::surface::Surface;
use crate::tables::TablesController;
use crate::visibility::ViewportProbe;

/// Host-provided implementations of every seam.
#[derive(Clone)]
pub struct Collaborators {
    pub transport: Rc<dyn HttpTransport>,
    pub probe: Rc<dyn ViewportProbe>,
    pub scheduler: Rc<dyn Scheduler>,
    pub renderer: Rc<dyn RenderBackend>,
    pub maps: Rc<dyn MapBackend>,
    pub surface: Rc<dyn Surface>,
}

pub struct DashboardContext {
    config: ApiConfig,
    timings: Timings,
    scheduler: Rc<dyn Scheduler>,
    filters: Rc<FilterStore>,
    api: Rc<ApiClient>,
    charts: Rc<ChartLifecycleManager>,
    maps: Rc<MapsController>,
    tables: Rc<TablesController>,
    cross_filter: Rc<CrossFilterCoordinator>,
    handlers: Rc<SectionHandlers>,
    loader: SectionLoader,
    sequence: SequenceGate,
    last_filters: RefCell<FilterState>,
    filter_listener: RefCell<Option<Listener>>,
}

/// Region clicks run the cross-filter on a detached task. The closure holds
/// the coordinator weakly since the maps it lives in belong to it.
fn region_click(
    cross_filter: &Rc<CrossFilterCoordinator>,
    scheduler: &Rc<dyn Scheduler>,
) -> RegionClick {
    let cross_filter = Rc::downgrade(cross_filter);
    let scheduler = Rc::clone(scheduler);
    Rc::new(move |uf: &str| {
        let Some(cross_filter) = cross_filter.upgrade() else {
            return;
        };
        let uf = uf.to_string();
        scheduler.spawn(
            async move {
                if let Err(error) = cross_filter.select_region(&uf).await {
                    tracing::warn!(uf = %uf, %error, "region selection failed");
                }
            }
            .boxed_local(),
        );
    })
}

impl DashboardContext {
    pub fn new(collaborators: Collaborators, config: ApiConfig) -> Rc<Self> {
        Self::with_options(
            collaborators,
            config,
            Timings::default(),
            ObserverOptions::default(),
        )
    }

    pub fn with_options(
        collaborators: Collaborators,
        config: ApiConfig,
        timings: Timings,
        observer: ObserverOptions,
    ) -> Rc<Self> {
        let Collaborators {
            transport,
            probe,
            scheduler,
            renderer,
            maps: map_backend,
            surface,
        } = collaborators;

        let filters = FilterStore::new();
        let api = Rc::new(ApiClient::new(transport, config.clone(), Rc::clone(&filters)));
        let charts = Rc::new(ChartLifecycleManager::new(
            renderer,
            Rc::clone(&probe),
            Rc::clone(&scheduler),
            timings,
        ));
        let maps = Rc::new(MapsController::new(map_backend));
        let tables = Rc::new(TablesController::new(Rc::clone(&surface)));
        let cross_filter = Rc::new(CrossFilterCoordinator::new(
            Rc::clone(&filters),
            Rc::clone(&api),
            Rc::clone(&charts),
            Rc::clone(&maps),
            Rc::clone(&tables),
        ));

        let handlers = Rc::new(SectionHandlers {
            api: Rc::clone(&api),
            filters: Rc::clone(&filters),
            charts: Rc::clone(&charts),
            maps: Rc::clone(&maps),
            tables: Rc::clone(&tables),
            surface: Rc::clone(&surface),
            cross_filter: Rc::clone(&cross_filter),
            on_region_click: region_click(&cross_filter, &scheduler),
        });

        let loader = SectionLoader::new(
            Rc::clone(&probe),
            Rc::clone(&scheduler),
            timings,
            observer,
        );
        for section in Section::ALL {
            loader.register(
                section.id(),
                Rc::new(SectionTask::new(Rc::clone(&handlers), section)),
                section.reload_exempt(),
                section.eager(),
            );
        }

        let sequence = SequenceGate::new(
            Rc::clone(&api),
            surface,
            probe,
            Rc::clone(&scheduler),
            timings,
        );

        let context = Rc::new(Self {
            config,
            timings,
            scheduler,
            filters,
            api,
            charts,
            maps,
            tables,
            cross_filter,
            handlers,
            loader,
            sequence,
            last_filters: RefCell::new(FilterState::default()),
            filter_listener: RefCell::new(None),
        });
        context.watch_filters();
        context
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn filters(&self) -> &Rc<FilterStore> {
        &self.filters
    }

    pub fn api(&self) -> &Rc<ApiClient> {
        &self.api
    }

    pub fn charts(&self) -> &Rc<ChartLifecycleManager> {
        &self.charts
    }

    pub fn maps(&self) -> &Rc<MapsController> {
        &self.maps
    }

    pub fn tables(&self) -> &Rc<TablesController> {
        &self.tables
    }

    pub fn cross_filter(&self) -> &Rc<CrossFilterCoordinator> {
        &self.cross_filter
    }

    pub fn loader(&self) -> &SectionLoader {
        &self.loader
    }

    pub fn sequence(&self) -> &SequenceGate {
        &self.sequence
    }

    /// Callback for bubble clicks on either map.
    pub fn region_click(&self) -> RegionClick {
        Rc::clone(&self.handlers.on_region_click)
    }

    /// Startup: eager sections alongside the entrance sequence.
    pub async fn start(&self) -> Vec<(String, LoadOutcome)> {
        let (outcomes, ()) = futures::join!(self.loader.start(), self.sequence.start());
        outcomes
    }

    /// Reloads the filter-sensitive sections that already rendered. A
    /// changed objeto also re-derives the impact donut.
    pub async fn refresh_filtered(&self) -> Vec<(String, LoadOutcome)> {
        let current = self.filters.filters();
        let previous = self.last_filters.replace(current.clone());

        let sensitive: Vec<&str> = Section::ALL
            .into_iter()
            .filter(|section| section.filter_sensitive())
            .map(Section::id)
            .collect();

        let donut = async {
            if previous.objeto != current.objeto
                && self.loader.is_loaded(Section::AnaliseImpacto.id())
            {
                if let Err(error) = self.cross_filter.refresh_donut().await {
                    tracing::warn!(%error, "donut refresh failed");
                }
            }
        };
        let (outcomes, ()) = futures::join!(self.loader.reload(&sensitive), donut);
        outcomes
    }

    /// Detaches the filter listener and tears down every widget.
    pub fn shutdown(&self) {
        if let Some(listener) = self.filter_listener.borrow_mut().take() {
            self.filters.unsubscribe(&listener);
        }
        self.charts.destroy_all();
        self.maps.destroy(MAP_NACIONAL);
        self.maps.destroy(MAP_IMPACTO);
    }

    fn watch_filters(self: &Rc<Self>) {
        let context: Weak<Self> = Rc::downgrade(self);
        let on_change = listener(move |_filters| {
            let Some(context) = context.upgrade() else {
                return Ok(());
            };
            let task = Rc::clone(&context);
            context.scheduler.spawn(
                async move {
                    let outcomes = task.refresh_filtered().await;
                    tracing::debug!(reloaded = outcomes.len(), "filters applied");
                }
                .boxed_local(),
            );
            Ok(())
        });
        self.filters.subscribe(Rc::clone(&on_change));
        *self.filter_listener.borrow_mut() = Some(on_change);
    }
}
