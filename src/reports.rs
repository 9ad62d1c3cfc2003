// Report generation: dashboard views and story relations built from the
// loaded market data, plus their conversion into exportable rows.
use crate::aggregate::{
    group_count, group_mean, group_sum, indexed_growth, mean_series, pivot, rolling_mean,
    sum_series, top_n, Observation, PivotTable, WINDOW_2Y, WINDOW_3Y,
};
use crate::canonical::Canonicalizer;
use crate::config::PipelineConfig;
use crate::geocode::{join_cached, GeocodeCache};
use crate::industry::{collapse_to_top_n, IndustryClassifier};
use crate::loader::MarketData;
use crate::types::{
    Dataset, GroupedSeriesRow, Insights, LeaseRecord, MapPinRow, MetroRentRow, OccupancyRow,
    RankingRow, RegionLeasingRow, RegionYearRow, SeriesRow,
};
use crate::util::format_number;
use chrono::{Datelike, NaiveDate};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// Which occupancy series the dashboard shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OccupancyView {
    #[default]
    Raw,
    TwoYear,
    ThreeYear,
}

impl fmt::Display for OccupancyView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OccupancyView::Raw => "Raw Data",
            OccupancyView::TwoYear => "2-Year Moving Average",
            OccupancyView::ThreeYear => "3-Year Moving Average",
        })
    }
}

/// The user's current dashboard selection. Both ends are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub view: OccupancyView,
}

impl DashboardFilter {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

/// Occupancy per (market, date) with both moving averages.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyPoint {
    pub market: String,
    pub date: NaiveDate,
    pub raw: f64,
    pub ma_2y: f64,
    pub ma_3y: f64,
}

impl OccupancyPoint {
    pub fn value(&self, view: OccupancyView) -> f64 {
        match view {
            OccupancyView::Raw => self.raw,
            OccupancyView::TwoYear => self.ma_2y,
            OccupancyView::ThreeYear => self.ma_3y,
        }
    }
}

/// Mean occupancy per (market, date) plus 2- and 3-year trailing means.
/// Averages run over the whole history, before any date filter.
pub fn occupancy_series(data: &MarketData) -> Vec<OccupancyPoint> {
    let raw = mean_series(data.occupancy.iter().filter_map(|r| {
        r.occupancy_proportion
            .map(|v| Observation::new(r.market.clone(), r.date, v))
    }));
    let ma_2y = rolling_mean(&raw, WINDOW_2Y);
    let ma_3y = rolling_mean(&raw, WINDOW_3Y);
    raw.into_iter()
        .zip(ma_2y)
        .zip(ma_3y)
        .map(|((r, two), three)| OccupancyPoint {
            market: r.market,
            date: r.date,
            raw: r.value,
            ma_2y: two.value,
            ma_3y: three.value,
        })
        .collect()
}

/// Relations behind the interactive dashboard for one filter.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub filter: DashboardFilter,
    pub price_trends: Vec<Observation>,
    pub occupancy: Vec<OccupancyPoint>,
    pub lease_activity: Vec<(String, f64)>,
    pub unemployment: Vec<Observation>,
    pub insights: Insights,
}

fn arg_best<'a>(
    items: impl IntoIterator<Item = (&'a str, f64)>,
    better: Ordering,
) -> Option<(String, f64)> {
    let mut best: Option<(&str, f64)> = None;
    for (key, value) in items {
        match best {
            Some((_, b)) if value.partial_cmp(&b) != Some(better) => {}
            _ => best = Some((key, value)),
        }
    }
    best.map(|(k, v)| (k.to_string(), v))
}

pub fn build_dashboard(data: &MarketData, filter: DashboardFilter) -> Dashboard {
    let price_trends = mean_series(data.prices.iter().filter(|r| filter.contains(r.date)).filter_map(
        |r| r.overall_rent.map(|v| Observation::new(r.market.clone(), r.date, v)),
    ));

    let occupancy: Vec<OccupancyPoint> = occupancy_series(data)
        .into_iter()
        .filter(|p| filter.contains(p.date))
        .collect();

    let leased = group_sum(
        data.leases
            .iter()
            .filter(|r| filter.contains(r.date))
            .filter_map(|r| r.leased_sf.map(|v| (r.market.clone(), v))),
    );
    let lease_activity = top_n(leased, usize::MAX);

    let unemployment = mean_series(
        data.unemployment
            .iter()
            .filter(|r| filter.contains(r.date))
            .filter_map(|r| r.unemployment_rate.map(|v| Observation::new(r.state.clone(), r.date, v))),
    );

    let latest = price_trends.iter().map(|o| o.date).max();
    let insights = Insights {
        most_affordable_market: latest.and_then(|d| {
            arg_best(
                price_trends
                    .iter()
                    .filter(|o| o.date == d)
                    .map(|o| (o.market.as_str(), o.value)),
                Ordering::Less,
            )
        }),
        highest_occupancy_market: latest.and_then(|d| {
            arg_best(
                occupancy
                    .iter()
                    .filter(|p| p.date == d)
                    .map(|p| (p.market.as_str(), p.value(filter.view))),
                Ordering::Greater,
            )
        }),
        most_active_market: arg_best(
            lease_activity.iter().map(|(m, v)| (m.as_str(), *v)),
            Ordering::Greater,
        ),
    };
    debug!(
        prices = price_trends.len(),
        occupancy = occupancy.len(),
        markets = lease_activity.len(),
        "built dashboard relations"
    );

    Dashboard {
        filter,
        price_trends,
        occupancy,
        lease_activity,
        unemployment,
        insights,
    }
}

/// Story tables that do not depend on the dashboard filter.
#[derive(Debug, Clone)]
pub struct Story {
    pub rent_index: Vec<Observation>,
    pub rent_growth: Vec<(String, f64)>,
    pub industry_leasing: Vec<Observation>,
    pub industry_totals: Vec<(String, f64)>,
    pub occupancy_change: Vec<(String, f64)>,
    pub industry_share: PivotTable,
    pub metro_rent: Vec<MetroRent>,
    pub metro_space: Vec<(String, f64)>,
    pub region_leasing: Vec<RegionQuarter>,
    pub region_shift: Vec<(String, f64)>,
    pub occupancy_heatmap: PivotTable,
    pub map_pins: Vec<MapPinRow>,
    pub region_price_leasing: Vec<RegionYear>,
    pub occupancy_rebound: Vec<GroupedObservation>,
    pub unemployment_highlights: Vec<Observation>,
    pub occupancy_us_average: Vec<Observation>,
}

/// Series label for cross-market averages.
pub const US_AVERAGE: &str = "US Avg";

#[derive(Debug, Clone, PartialEq)]
pub struct MetroRent {
    pub metro: String,
    pub avg_rent: f64,
    pub lease_count: usize,
    pub cost_of_living: f64,
    pub indexed_rent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionYear {
    pub region: String,
    pub year: i32,
    pub leasing: f64,
}

/// An observation tagged with the comparison group of its market.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedObservation {
    pub group: String,
    pub observation: Observation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionQuarter {
    pub region: String,
    pub year: i32,
    pub quarter: u32,
    pub leasing: f64,
}

/// Per-lease derived labels: metro and collapsed industry group.
#[derive(Debug, Clone)]
pub struct LeaseLabels {
    pub metros: Vec<String>,
    pub industries: Vec<String>,
    pub top_industries: Vec<String>,
}

pub fn label_leases(
    leases: &[LeaseRecord],
    canon: &Canonicalizer,
    classifier: &IndustryClassifier,
    top_industries: usize,
) -> LeaseLabels {
    let metros = leases.iter().map(|l| canon.metro(l.city.as_deref())).collect();
    let mut industries: Vec<String> = leases
        .iter()
        .map(|l| classifier.classify(l.industry.as_deref()))
        .collect();
    let top_industries = collapse_to_top_n(&mut industries, top_industries);
    LeaseLabels {
        metros,
        industries,
        top_industries,
    }
}

/// Rent for the configured target markets, indexed to the baseline quarter.
pub fn rent_index(data: &MarketData, canon: &Canonicalizer, baseline: NaiveDate) -> Vec<Observation> {
    let by_code = mean_series(data.prices.iter().filter_map(|r| {
        let code = canon.lookup(Dataset::Price, &r.market)?;
        Some(Observation::new(code, r.date, r.overall_rent?))
    }));
    indexed_growth(&by_code, baseline)
}

/// Growth in percent at the most recent indexed quarter, largest first.
pub fn latest_growth(index: &[Observation]) -> Vec<(String, f64)> {
    let Some(latest) = index.iter().map(|o| o.date).max() else {
        return Vec::new();
    };
    let at_latest: BTreeMap<String, f64> = index
        .iter()
        .filter(|o| o.date == latest)
        .map(|o| (o.market.clone(), o.value - 100.0))
        .collect();
    let n = at_latest.len();
    top_n(at_latest, n)
}

/// Leased SF per (market code, quarter) for one exact industry label.
pub fn industry_leasing(data: &MarketData, canon: &Canonicalizer, industry: &str) -> Vec<Observation> {
    sum_series(data.leases.iter().filter_map(|r| {
        if r.industry.as_deref() != Some(industry) {
            return None;
        }
        let code = canon.lookup(Dataset::Leases, &r.market)?;
        Some(Observation::new(code, r.date, r.leased_sf?))
    }))
}

/// Percentage-point change: mean occupancy from the baseline year on versus
/// the mean over `pre_year`. Markets missing either side are left out.
pub fn occupancy_change(
    data: &MarketData,
    canon: &Canonicalizer,
    pre_year: i32,
    post_from: i32,
) -> Vec<(String, f64)> {
    let by_code = mean_series(data.occupancy.iter().filter_map(|r| {
        let code = canon.lookup(Dataset::Occupancy, &r.market)?;
        Some(Observation::new(code, r.date, r.occupancy_proportion?))
    }));
    let pre = group_mean(
        by_code
            .iter()
            .filter(|o| o.date.year() == pre_year)
            .map(|o| (o.market.clone(), o.value)),
    );
    let post = group_mean(
        by_code
            .iter()
            .filter(|o| o.date.year() >= post_from)
            .map(|o| (o.market.clone(), o.value)),
    );
    let change: BTreeMap<String, f64> = post
        .into_iter()
        .filter_map(|(market, after)| {
            let before = pre.get(&market)?;
            Some((market, ((after - before) * 1000.0).round() / 10.0))
        })
        .collect();
    let n = change.len();
    top_n(change, n)
}

/// Share (percent) of each metro's leases per industry group, restricted to
/// the busiest metros and the retained industry groups.
pub fn industry_share(labels: &LeaseLabels, top_metros: usize) -> PivotTable {
    let counts = group_count(
        labels
            .metros
            .iter()
            .cloned()
            .zip(labels.industries.iter().cloned()),
    );
    let metro_totals = group_sum(counts.iter().map(|((metro, _), c)| (metro.clone(), *c as f64)));
    let busiest: Vec<String> = top_n(metro_totals, top_metros)
        .into_iter()
        .map(|(metro, _)| metro)
        .collect();
    pivot(
        counts
            .into_iter()
            .map(|((metro, industry), c)| (metro, industry, c as f64)),
    )
    .row_shares()
    .select(&busiest, &labels.top_industries)
}

pub fn metro_rent(
    leases: &[LeaseRecord],
    labels: &LeaseLabels,
    canon: &Canonicalizer,
    min_leases: usize,
    top: usize,
) -> Vec<MetroRent> {
    let rents: Vec<(String, f64)> = leases
        .iter()
        .zip(&labels.metros)
        .filter_map(|(l, metro)| l.overall_rent.map(|v| (metro.clone(), v)))
        .collect();
    let counts = group_count(rents.iter().map(|(m, _)| m.clone()));
    let means = group_mean(rents);
    let mut rows: Vec<MetroRent> = means
        .into_iter()
        .filter_map(|(metro, avg_rent)| {
            let lease_count = counts.get(&metro).copied().unwrap_or(0);
            if lease_count <= min_leases {
                return None;
            }
            let cost_of_living = canon.cost_of_living(&metro);
            Some(MetroRent {
                indexed_rent: avg_rent / cost_of_living,
                metro,
                avg_rent,
                lease_count,
                cost_of_living,
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        b.indexed_rent
            .partial_cmp(&a.indexed_rent)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.metro.cmp(&b.metro))
    });
    rows.truncate(top);
    rows
}

pub fn metro_space(leases: &[LeaseRecord], labels: &LeaseLabels, top: usize) -> Vec<(String, f64)> {
    let space = group_sum(
        leases
            .iter()
            .zip(&labels.metros)
            .filter_map(|(l, metro)| l.available_space.map(|v| (metro.clone(), v))),
    );
    top_n(space, top)
}

/// Quarterly leasing totals per broad region, ordered by year, quarter,
/// region.
pub fn region_leasing(leases: &[LeaseRecord], canon: &Canonicalizer) -> Vec<RegionQuarter> {
    group_sum(leases.iter().filter_map(|l| {
        let region = canon.region(l.state.as_deref()).to_string();
        Some(((l.year, l.quarter, region), l.leasing?))
    }))
    .into_iter()
    .map(|((year, quarter, region), leasing)| RegionQuarter {
        region,
        year,
        quarter,
        leasing,
    })
    .collect()
}

/// Mean quarterly leasing from `split_year` on minus the mean before it.
pub fn region_shift(quarters: &[RegionQuarter], split_year: i32) -> Vec<(String, f64)> {
    let side = |after: bool| {
        group_mean(
            quarters
                .iter()
                .filter(|q| (q.year >= split_year) == after)
                .map(|q| (q.region.clone(), q.leasing)),
        )
    };
    let pre = side(false);
    side(true)
        .into_iter()
        .filter_map(|(region, post)| pre.get(&region).map(|before| (region, post - before)))
        .collect()
}

/// Mean occupancy by quarter label (rows) and year (columns).
pub fn occupancy_heatmap(data: &MarketData) -> PivotTable {
    let means = group_mean(data.occupancy.iter().filter_map(|r| {
        Some(((format!("Q{}", r.quarter), r.year.to_string()), r.occupancy_proportion?))
    }));
    pivot(means.into_iter().map(|((q, y), v)| (q, y, v)))
}

pub fn map_pins(
    leases: &[LeaseRecord],
    labels: &LeaseLabels,
    cache: &GeocodeCache,
    metro: &str,
    limit: usize,
) -> Vec<MapPinRow> {
    let candidates = leases
        .iter()
        .zip(&labels.metros)
        .zip(&labels.industries)
        .filter(|((_, m), _)| m.as_str() == metro)
        .filter_map(|((lease, _), industry)| {
            lease.address.as_deref().map(|address| (address, (lease, industry)))
        });
    join_cached(candidates, cache, limit)
        .into_iter()
        .map(|pin| {
            let (lease, industry) = pin.item;
            MapPinRow {
                address: lease.address.clone().unwrap_or_default(),
                company: lease.company_name.clone().unwrap_or_default(),
                industry_group: industry.clone(),
                lat: pin.lat,
                lon: pin.lon,
            }
        })
        .collect()
}

/// Mean price-file leasing per (region, year). Rows without a region are
/// left out.
pub fn region_price_leasing(data: &MarketData) -> Vec<RegionYear> {
    group_mean(
        data.prices
            .iter()
            .filter_map(|r| Some(((r.region.clone()?, r.year), r.leasing?))),
    )
    .into_iter()
    .map(|((region, year), leasing)| RegionYear {
        region,
        year,
        leasing,
    })
    .collect()
}

/// Occupancy per (market, quarter) from `from_year` on, for markets that
/// belong to a comparison group.
pub fn occupancy_rebound(
    data: &MarketData,
    canon: &Canonicalizer,
    from_year: i32,
) -> Vec<GroupedObservation> {
    mean_series(
        data.occupancy
            .iter()
            .filter(|r| r.year >= from_year && canon.market_group(&r.market).is_some())
            .filter_map(|r| {
                r.occupancy_proportion
                    .map(|v| Observation::new(r.market.trim(), r.date, v))
            }),
    )
    .into_iter()
    .filter_map(|observation| {
        let group = canon.market_group(&observation.market)?.to_string();
        Some(GroupedObservation { group, observation })
    })
    .collect()
}

/// The per-date mean of state unemployment rates, labelled [`US_AVERAGE`],
/// followed by the series of each highlighted state in the given order.
pub fn unemployment_highlights(data: &MarketData, states: &[String]) -> Vec<Observation> {
    let per_state = mean_series(data.unemployment.iter().filter_map(|r| {
        r.unemployment_rate
            .map(|v| Observation::new(r.state.clone(), r.date, v))
    }));
    let mut out: Vec<Observation> = group_mean(per_state.iter().map(|o| (o.date, o.value)))
        .into_iter()
        .map(|(date, value)| Observation::new(US_AVERAGE, date, value))
        .collect();
    for state in states {
        out.extend(
            per_state
                .iter()
                .filter(|o| o.market.eq_ignore_ascii_case(state))
                .cloned(),
        );
    }
    out
}

/// Mean occupancy per quarter over every market row.
pub fn occupancy_us_average(data: &MarketData) -> Vec<Observation> {
    group_mean(
        data.occupancy
            .iter()
            .filter_map(|r| Some((r.date, r.occupancy_proportion?))),
    )
    .into_iter()
    .map(|(date, value)| Observation::new(US_AVERAGE, date, value))
    .collect()
}

pub fn build_story(
    data: &MarketData,
    canon: &Canonicalizer,
    classifier: &IndustryClassifier,
    cache: &GeocodeCache,
    config: &PipelineConfig,
) -> Story {
    let baseline = config.baseline;
    let labels = label_leases(&data.leases, canon, classifier, config.top_industries);

    let rent_index = rent_index(data, canon, baseline);
    let rent_growth = latest_growth(&rent_index);

    let industry_leasing = industry_leasing(data, canon, &config.target_industry);
    let industry_totals = {
        let totals = group_sum(
            industry_leasing
                .iter()
                .filter(|o| o.date >= baseline)
                .map(|o| (o.market.clone(), o.value / 1_000_000.0)),
        );
        let n = totals.len();
        top_n(totals, n)
    };

    let region_leasing = region_leasing(&data.leases, canon);
    let region_shift = region_shift(&region_leasing, config.shift_year);

    let story = Story {
        occupancy_change: occupancy_change(data, canon, config.pre_period_year, baseline.year()),
        industry_share: industry_share(&labels, config.top_metros),
        metro_rent: metro_rent(&data.leases, &labels, canon, config.min_metro_leases, config.top_metros),
        metro_space: metro_space(&data.leases, &labels, config.top_metros),
        occupancy_heatmap: occupancy_heatmap(data),
        map_pins: map_pins(&data.leases, &labels, cache, &config.map_metro, config.map_pin_limit),
        region_price_leasing: region_price_leasing(data),
        occupancy_rebound: occupancy_rebound(data, canon, config.shift_year),
        unemployment_highlights: unemployment_highlights(data, &config.highlight_states),
        occupancy_us_average: occupancy_us_average(data),
        rent_index,
        rent_growth,
        industry_leasing,
        industry_totals,
        region_leasing,
        region_shift,
    };
    info!(
        indexed_markets = story.rent_growth.len(),
        industries = labels.top_industries.len(),
        pins = story.map_pins.len(),
        "built story tables"
    );
    story
}

// Row conversions for export and preview.

pub fn series_rows(series: &[Observation], decimals: usize) -> Vec<SeriesRow> {
    series
        .iter()
        .map(|o| SeriesRow {
            market: o.market.clone(),
            date: o.date,
            value: format_number(o.value, decimals),
        })
        .collect()
}

pub fn ranking_rows(groups: &[(String, f64)], decimals: usize) -> Vec<RankingRow> {
    groups
        .iter()
        .enumerate()
        .map(|(idx, (label, value))| RankingRow {
            rank: idx + 1,
            label: label.clone(),
            value: format_number(*value, decimals),
        })
        .collect()
}

pub fn occupancy_rows(points: &[OccupancyPoint], view: OccupancyView) -> Vec<OccupancyRow> {
    points
        .iter()
        .map(|p| OccupancyRow {
            market: p.market.clone(),
            date: p.date,
            occupancy: format_number(p.raw, 4),
            occupancy_ma_2y: format_number(p.ma_2y, 4),
            occupancy_ma_3y: format_number(p.ma_3y, 4),
            selected: format_number(p.value(view), 4),
        })
        .collect()
}

pub fn metro_rent_rows(rows: &[MetroRent]) -> Vec<MetroRentRow> {
    rows.iter()
        .map(|r| MetroRentRow {
            metro: r.metro.clone(),
            avg_rent: format_number(r.avg_rent, 2),
            lease_count: r.lease_count,
            cost_of_living: format_number(r.cost_of_living, 2),
            indexed_rent: format_number(r.indexed_rent, 2),
        })
        .collect()
}

pub fn region_year_rows(rows: &[RegionYear]) -> Vec<RegionYearRow> {
    rows.iter()
        .map(|r| RegionYearRow {
            region: r.region.clone(),
            year: r.year,
            leasing: format_number(r.leasing, 0),
        })
        .collect()
}

pub fn grouped_rows(rows: &[GroupedObservation], decimals: usize) -> Vec<GroupedSeriesRow> {
    rows.iter()
        .map(|r| GroupedSeriesRow {
            group: r.group.clone(),
            market: r.observation.market.clone(),
            date: r.observation.date,
            value: format_number(r.observation.value, decimals),
        })
        .collect()
}

pub fn region_rows(rows: &[RegionQuarter]) -> Vec<RegionLeasingRow> {
    rows.iter()
        .map(|r| RegionLeasingRow {
            region: r.region.clone(),
            year: r.year,
            quarter: format!("Q{}", r.quarter),
            leasing: format_number(r.leasing, 0),
        })
        .collect()
}
