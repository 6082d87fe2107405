use crate::conversion::{convert_all, ConversionInput, ConversionTable};
use crate::fetcher::HttpRateFetcher;
use crate::rate_source::{RateFetcher, RateSourceDescriptor, RateSourceRegistry};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, warn};
use twd_fx_common::{
    AcquisitionResult, ConverterConfig, Currency, DataSource, RateError, RateFragment, RateSet,
    SourceError,
};

const EVENT_CAPACITY: usize = 16;

/// 화면에 표시할 현재 환율 상태
#[derive(Debug, Clone, PartialEq)]
pub struct RateBoard {
    pub rates: RateSet,
    pub last_update: Option<DateTime<Utc>>,
    pub data_source: DataSource,
    /// 값이 들어 있는 입력 칸
    pub input: Option<ConversionInput>,
    pub conversion: Option<ConversionTable>,
}

impl RateBoard {
    pub fn new(rates: RateSet) -> Self {
        Self {
            rates,
            last_update: None,
            data_source: DataSource::Default,
            input: None,
            conversion: None,
        }
    }

    /// 현재 입력을 현재 환율로 다시 환산
    fn recompute(&mut self) -> Option<ConversionTable> {
        self.conversion = self.input.map(|input| convert_all(&self.rates, input));
        self.conversion
    }
}

/// 렌더링 쪽으로 보내는 이벤트
#[derive(Debug, Clone, PartialEq)]
pub enum RateEvent {
    RatesUpdated {
        rates: RateSet,
        source: DataSource,
        at: DateTime<Utc>,
    },
    AcquisitionFailed,
    ConversionRecomputed(ConversionTable),
}

/// 진행 중 플래그. drop 시 해제
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// 여러 환율 API를 순서대로 시도해서 현재 환율을 갱신하는 컨트롤러
pub struct RateAcquisitionController {
    registry: RateSourceRegistry,
    fetcher: Box<dyn RateFetcher>,
    request_timeout: Duration,
    board: RwLock<RateBoard>,
    in_flight: AtomicBool,
    events: broadcast::Sender<RateEvent>,
}

impl RateAcquisitionController {
    pub fn new(
        registry: RateSourceRegistry,
        fetcher: Box<dyn RateFetcher>,
        request_timeout: Duration,
        initial_rates: RateSet,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            registry,
            fetcher,
            request_timeout,
            board: RwLock::new(RateBoard::new(initial_rates)),
            in_flight: AtomicBool::new(false),
            events,
        }
    }

    /// 설정에서 레지스트리와 HTTP 클라이언트를 만듭니다
    pub fn from_config(config: &ConverterConfig) -> anyhow::Result<Self> {
        let registry = RateSourceRegistry::from_config(config)?;
        let fetcher = HttpRateFetcher::new(config.request_timeout(), &config.user_agent)?;
        let initial_rates = config.default_rate_set()?;

        Ok(Self::new(
            registry,
            Box::new(fetcher),
            config.request_timeout(),
            initial_rates,
        ))
    }

    pub fn registry(&self) -> &RateSourceRegistry {
        &self.registry
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RateEvent> {
        self.events.subscribe()
    }

    pub fn is_acquiring(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn snapshot(&self) -> RateBoard {
        self.board.read().await.clone()
    }

    pub async fn rates(&self) -> RateSet {
        self.board.read().await.rates
    }

    /// 최신 환율 가져오기
    ///
    /// 레지스트리 순서대로 한 번에 하나씩 시도하고, 처음으로 정규화에 성공한 소스의
    /// 환율을 병합합니다. 이미 진행 중이면 아무것도 하지 않고 `None`을 반환합니다.
    pub async fn acquire(&self) -> Option<AcquisitionResult> {
        let Some(_guard) = InFlightGuard::try_acquire(&self.in_flight) else {
            debug!("Rate acquisition already in flight, skipping");
            return None;
        };

        let result = self.try_sources().await;
        self.apply(&result).await;
        Some(result)
    }

    async fn try_sources(&self) -> AcquisitionResult {
        for descriptor in self.registry.iter() {
            info!("Trying {} for exchange rates...", descriptor.name());

            match self.fetch_from(descriptor).await {
                Ok(fragment) => {
                    info!(
                        "✅ Updated {} rates from {}",
                        fragment.len(),
                        descriptor.name()
                    );
                    return AcquisitionResult::Success {
                        fragment,
                        source: descriptor.name().to_string(),
                    };
                }
                Err(e) => {
                    warn!("❌ {} failed: {}", descriptor.name(), e);
                }
            }
        }

        error!(
            "All {} rate sources failed, keeping current rates",
            self.registry.len()
        );
        AcquisitionResult::AllSourcesFailed
    }

    async fn fetch_from(&self, descriptor: &RateSourceDescriptor) -> Result<RateFragment, SourceError> {
        let raw = tokio::time::timeout(
            self.request_timeout,
            self.fetcher.fetch_json(descriptor.endpoint()),
        )
        .await
        .map_err(|_| {
            SourceError::Network(format!("timed out after {:?}", self.request_timeout))
        })??;

        descriptor.normalize(&raw)
    }

    async fn apply(&self, result: &AcquisitionResult) {
        match result {
            AcquisitionResult::Success { fragment, source } => {
                let now = Utc::now();
                let (rates, data_source, recomputed) = {
                    let mut board = self.board.write().await;
                    board.rates.merge(fragment);
                    board.last_update = Some(now);
                    board.data_source = DataSource::Live(source.clone());
                    let recomputed = board.recompute();
                    (board.rates, board.data_source.clone(), recomputed)
                };

                self.publish(RateEvent::RatesUpdated {
                    rates,
                    source: data_source,
                    at: now,
                });
                if let Some(table) = recomputed {
                    self.publish(RateEvent::ConversionRecomputed(table));
                }
            }
            AcquisitionResult::AllSourcesFailed => {
                // 환율이 그대로이므로 재계산 없음
                self.board.write().await.data_source = DataSource::Default;
                self.publish(RateEvent::AcquisitionFailed);
            }
        }
    }

    /// 사용자가 환율 칸을 직접 수정
    pub async fn set_rate(&self, currency: Currency, rate: f64) -> Result<(), RateError> {
        let now = Utc::now();
        let (rates, recomputed) = {
            let mut board = self.board.write().await;
            board.rates.set(currency, rate)?;
            board.last_update = Some(now);
            board.data_source = DataSource::Manual;
            (board.rates, board.recompute())
        };

        info!("Rate for {} set manually to {}", currency, rate);
        self.publish(RateEvent::RatesUpdated {
            rates,
            source: DataSource::Manual,
            at: now,
        });
        if let Some(table) = recomputed {
            self.publish(RateEvent::ConversionRecomputed(table));
        }
        Ok(())
    }

    /// 통화 칸에 입력된 텍스트로 환산. 빈 값이나 잘못된 값이면 표시를 지움
    pub async fn set_input(&self, currency: Currency, text: &str) -> Option<ConversionTable> {
        let mut board = self.board.write().await;
        board.input = ConversionInput::parse(currency, text);
        board.recompute()
    }

    pub async fn clear_input(&self) {
        let mut board = self.board.write().await;
        board.input = None;
        board.conversion = None;
    }

    /// 현재 환율로 표시 중인 환산을 다시 계산
    pub async fn recompute(&self) -> Option<ConversionTable> {
        let recomputed = self.board.write().await.recompute();
        if let Some(table) = recomputed {
            self.publish(RateEvent::ConversionRecomputed(table));
        }
        recomputed
    }

    fn publish(&self, event: RateEvent) {
        // 구독자가 없으면 버림
        let _ = self.events.send(event);
    }
}
