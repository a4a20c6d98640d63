use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FastStatus {
    #[default]
    NotStarted,
    Active,
    Paused,
    Ended,
}

/// A fast as reported by the backend. Elapsed time is never stored here; see
/// [`crate::timer`] for the derived values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Fast {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub target_hours: f64,
    #[serde(default)]
    pub paused_at: Option<DateTime<Utc>>,
    /// Cumulative milliseconds spent paused.
    #[serde(default)]
    pub paused_duration: i64,
    #[serde(default)]
    pub status: FastStatus,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub protocol: Option<String>,
}

impl Fast {
    pub fn is_running(&self) -> bool {
        matches!(self.status, FastStatus::Active | FastStatus::Paused) && self.start_time.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.status == FastStatus::Paused
    }

    /// Forces `paused_at` to agree with `status`.
    pub fn normalized(mut self) -> Self {
        if self.status != FastStatus::Paused {
            self.paused_at = None;
        } else if self.paused_at.is_none() {
            self.status = FastStatus::Active;
        }
        if self.paused_duration < 0 {
            self.paused_duration = 0;
        }
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Protocol {
    #[serde(rename = "12:12")]
    TwelveTwelve,
    #[serde(rename = "14:10")]
    FourteenTen,
    #[serde(rename = "16:8")]
    SixteenEight,
    #[serde(rename = "18:6")]
    EighteenSix,
    #[serde(rename = "20:4")]
    TwentyFour,
    #[serde(rename = "omad")]
    Omad,
    #[serde(rename = "36h")]
    ThirtySix,
}

impl Protocol {
    pub const ALL: [Protocol; 7] = [
        Protocol::TwelveTwelve,
        Protocol::FourteenTen,
        Protocol::SixteenEight,
        Protocol::EighteenSix,
        Protocol::TwentyFour,
        Protocol::Omad,
        Protocol::ThirtySix,
    ];

    pub fn target_hours(self) -> f64 {
        match self {
            Protocol::TwelveTwelve => 12.0,
            Protocol::FourteenTen => 14.0,
            Protocol::SixteenEight => 16.0,
            Protocol::EighteenSix => 18.0,
            Protocol::TwentyFour => 20.0,
            Protocol::Omad => 23.0,
            Protocol::ThirtySix => 36.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Protocol::TwelveTwelve => "12:12",
            Protocol::FourteenTen => "14:10",
            Protocol::SixteenEight => "16:8",
            Protocol::EighteenSix => "18:6",
            Protocol::TwentyFour => "20:4",
            Protocol::Omad => "omad",
            Protocol::ThirtySix => "36h",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StartFastRequest {
    #[serde(default)]
    pub protocol: Option<Protocol>,
    #[serde(default)]
    pub target_hours: Option<f64>,
}

/// Uniform envelope handed to the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FastSnapshot {
    pub fast: Option<Fast>,
    pub elapsed_ms: i64,
    pub remaining_ms: i64,
    pub progress: f64,
    pub zone: &'static str,
    pub zone_index: usize,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightEntry {
    pub weight_kg: f64,
    #[serde(default)]
    pub logged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydrationEntry {
    pub amount_ml: u32,
    #[serde(default)]
    pub logged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodEntry {
    pub mood: u8,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub logged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealEntry {
    pub description: String,
    #[serde(default)]
    pub calories: Option<u32>,
    #[serde(default)]
    pub logged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogReceipt {
    pub queued: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Circle {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub member_count: u32,
    #[serde(default)]
    pub is_member: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CircleMember {
    pub user_id: String,
    pub display_name: String,
    #[serde(default)]
    pub fasting: bool,
    #[serde(default)]
    pub fast_started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCircleRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BuddyRequest {
    pub buddy_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub calories: Option<u32>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecipeQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CoachingRequest {
    pub topic: String,
    #[serde(default)]
    pub question: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachingReply {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_protocol")]
    pub default_protocol: Protocol,
    #[serde(default = "default_hydration_goal")]
    pub hydration_goal_ml: u32,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    #[serde(default)]
    pub weight_unit: Option<String>,
}

fn default_protocol() -> Protocol {
    Protocol::SixteenEight
}

fn default_hydration_goal() -> u32 {
    2000
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SleepQuality {
    Poor,
    Fair,
    Good,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StressLevel {
    High,
    Moderate,
    Low,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Soreness {
    Severe,
    Mild,
    None,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckInInputs {
    pub sleep: SleepQuality,
    pub stress: StressLevel,
    pub soreness: Soreness,
    /// 1-10
    pub energy: u8,
    /// 1-10
    pub motivation: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Restorative,
    Gentle,
    Standard,
    Extended,
}

impl Recommendation {
    pub fn protocol(self) -> Protocol {
        match self {
            Recommendation::Restorative => Protocol::TwelveTwelve,
            Recommendation::Gentle => Protocol::FourteenTen,
            Recommendation::Standard => Protocol::SixteenEight,
            Recommendation::Extended => Protocol::EighteenSix,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckInResult {
    pub inputs: CheckInInputs,
    pub score: u8,
    pub recommendation: Recommendation,
    pub protocol: Protocol,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedFast {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub target_hours: f64,
    #[serde(default)]
    pub paused_duration: i64,
}

#[derive(Debug, Serialize)]
pub struct DailyPoint {
    pub date: String,
    pub fasted_hours: f64,
    pub fasts_completed: u32,
}

#[derive(Debug, Serialize)]
pub struct WeeklyPoint {
    pub week: String,
    pub start_date: String,
    pub end_date: String,
    pub fasted_hours: f64,
    pub fasts_completed: u32,
}

#[derive(Debug, Serialize)]
pub struct WeeklyAveragePoint {
    pub week: String,
    pub days_counted: u8,
    pub avg_hours: f64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub last_7_days: Vec<DailyPoint>,
    pub weekly_totals: Vec<WeeklyPoint>,
    pub weekly_averages: Vec<WeeklyAveragePoint>,
    pub completed: u32,
    pub completion_rate: f64,
    pub current_streak_days: u32,
    pub last_fast_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct NavRequest {
    pub tab: crate::app_store::Tab,
}

#[derive(Debug, Deserialize)]
pub struct TrialRequest {
    pub reaction_ms: u32,
}
