use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use booking::api::{BookingApi, BookingHttpClient};
use booking::cache::CachedBookingApi;
use booking::config::ApiConfig;
use booking::error::AppError;
use booking::services::{
    CoursePage, DashboardReservations, DashboardSummary, Feedback, ReservationReconciler,
    RescheduleFlow, RollbackPolicy, SlotAvailability, format_clp,
};
use booking::session::Session;
use booking::validation;

const USAGE: &str = "usage: booking <command>

commands:
  slots <course>                     bookable slots of a course, by day
  sessions <course-id>               classes of a course and your access
  reservations                       your upcoming reservations
  reserve <slot-id>                  reserve a slot
  cancel <reservation-id>            cancel a reservation
  reschedule <reservation-id> [slot] list options, or move to <slot>
  refund <reservation-id>            request a refund
  access <class-id>                  check paid access to a class
  dashboard                          admin dashboard
  rut <value>                        validate and format a RUT
  phone <value>                      validate and normalize a phone";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "booking=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    }

    if let Err(e) = run(&args).await {
        error!("{}", e);
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}

struct Context {
    api: Arc<dyn BookingApi>,
    session: Option<Session>,
    config: ApiConfig,
}

impl Context {
    fn from_env() -> Result<Self, AppError> {
        let config = ApiConfig::new_from_env()?;
        let session = config.token.clone().map(Session::from_token).transpose()?;
        if let Some(session) = &session {
            session.ensure_valid(Utc::now())?;
        }

        let mut client = BookingHttpClient::new(&config)?;
        if let Some(session) = session.clone() {
            client = client.with_session(session);
        }

        let api: Arc<dyn BookingApi> =
            Arc::new(CachedBookingApi::new(Arc::new(client), config.cache_ttl));
        info!("Using booking API at {}", config.base_url);

        Ok(Self {
            api,
            session,
            config,
        })
    }

    fn student_id(&self) -> Result<i64, AppError> {
        match &self.session {
            Some(session) => session.require_student_id(),
            None => Err(AppError::Auth("BOOKING_TOKEN is not set".to_string())),
        }
    }
}

fn arg_id(args: &[String], idx: usize, name: &str) -> Result<i64, AppError> {
    args.get(idx)
        .ok_or_else(|| AppError::Validation(format!("missing <{}>\n\n{}", name, USAGE)))?
        .parse::<i64>()
        .map_err(|_| AppError::Validation(format!("<{}> must be a number", name)))
}

fn report(feedback: Feedback) -> Result<(), AppError> {
    match feedback {
        Feedback::Success(msg) => {
            println!("{}", msg);
            Ok(())
        }
        Feedback::Error(msg) => Err(AppError::Validation(msg)),
    }
}

async fn run(args: &[String]) -> Result<(), AppError> {
    match args[0].as_str() {
        "rut" => {
            let raw = args.get(1).map(String::as_str).unwrap_or_default();
            println!("{}", validation::parse_rut(raw)?);
            Ok(())
        }
        "phone" => {
            let raw = args.get(1).map(String::as_str).unwrap_or_default();
            println!("{}", validation::parse_phone(raw)?);
            Ok(())
        }
        "slots" => {
            let ctx = Context::from_env()?;
            let course_ref = args
                .get(1)
                .ok_or_else(|| AppError::Validation(format!("missing <course>\n\n{}", USAGE)))?;
            let mut availability = SlotAvailability::new(ctx.api.clone(), ctx.config.utc_offset()?);
            if let Ok(student_id) = ctx.student_id() {
                availability = availability.for_student(student_id);
            }
            let view = availability.load_slots(course_ref).await?;
            let offset = ctx.config.utc_offset()?;

            println!("{} - {}", view.acronym, view.title);
            for day in &view.days {
                println!("\n{}", day.label());
                for entry in &day.slots {
                    let slot = &entry.slot;
                    let state = if entry.occupancy.reserved_by_current_user {
                        "reservado".to_string()
                    } else if entry.occupancy.is_full {
                        "lleno".to_string()
                    } else {
                        format!("{} cupos", entry.occupancy.available_spots)
                    };
                    println!(
                        "  [{}] {}-{} {:?} {}",
                        slot.id,
                        slot.start_time.with_timezone(&offset).format("%H:%M"),
                        slot.end_time.with_timezone(&offset).format("%H:%M"),
                        slot.modality,
                        state
                    );
                }
            }
            Ok(())
        }
        "sessions" => {
            let ctx = Context::from_env()?;
            let course_id = arg_id(args, 1, "course-id")?;
            let page = CoursePage::load(ctx.api.clone(), course_id).await?;
            println!("{} - {}", page.course.acronym, page.course.title);
            for (class, has_access) in page.classes() {
                println!(
                    "  {}. {} {} {}",
                    class.order_index,
                    class.title,
                    format_clp(class.base_price),
                    if has_access { "(acceso)" } else { "" }
                );
            }
            Ok(())
        }
        "reservations" => {
            let ctx = Context::from_env()?;
            let dashboard =
                DashboardReservations::load(ctx.api.clone(), RollbackPolicy::default()).await?;
            let offset = ctx.config.utc_offset()?;
            for r in dashboard.upcoming(Utc::now()) {
                let when = r
                    .start_time()
                    .map(|t| t.with_timezone(&offset).format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!(
                    "  [{}] slot {} {} {:?} pagado={}",
                    r.id,
                    r.slot_id,
                    when,
                    r.status,
                    r.is_paid()
                );
            }
            Ok(())
        }
        "reserve" => {
            let ctx = Context::from_env()?;
            let slot_id = arg_id(args, 1, "slot-id")?;
            let reconciler = ReservationReconciler::new(ctx.api.clone());
            report(reconciler.reserve(ctx.student_id()?, slot_id).await)
        }
        "cancel" => {
            let ctx = Context::from_env()?;
            let reservation_id = arg_id(args, 1, "reservation-id")?;
            let reconciler = ReservationReconciler::new(ctx.api.clone());
            report(reconciler.cancel(reservation_id, || async {}).await)
        }
        "reschedule" => {
            let ctx = Context::from_env()?;
            let reservation_id = arg_id(args, 1, "reservation-id")?;
            let mut flow = RescheduleFlow::load(ctx.api.clone(), reservation_id).await?;
            if args.len() > 2 {
                flow.select(arg_id(args, 2, "slot")?)?;
                return report(flow.confirm().await);
            }

            let offset = ctx.config.utc_offset()?;
            if flow.options().is_empty() {
                println!("No hay horarios alternativos. Puedes solicitar un reembolso.");
            }
            for slot in flow.options() {
                println!(
                    "  [{}] {}",
                    slot.id,
                    slot.start_time.with_timezone(&offset).format("%Y-%m-%d %H:%M")
                );
            }
            Ok(())
        }
        "refund" => {
            let ctx = Context::from_env()?;
            let reservation_id = arg_id(args, 1, "reservation-id")?;
            let flow = RescheduleFlow::load(ctx.api.clone(), reservation_id).await?;
            report(flow.refund().await)
        }
        "access" => {
            let ctx = Context::from_env()?;
            let class_id = arg_id(args, 1, "class-id")?;
            let dashboard =
                DashboardReservations::load(ctx.api.clone(), RollbackPolicy::default()).await?;
            println!("{}", dashboard.has_access_to_class(class_id));
            Ok(())
        }
        "dashboard" => {
            let ctx = Context::from_env()?;
            let summary = DashboardSummary::load(ctx.api.clone()).await?;
            for (label, value) in summary.lines() {
                println!("{:<18} {}", label, value);
            }
            println!("\nReservas recientes");
            for line in summary.recent_reservation_lines() {
                println!("  {}", line);
            }
            println!("\nPagos pendientes");
            for line in summary.pending_payment_lines() {
                println!("  {}", line);
            }
            Ok(())
        }
        other => Err(AppError::Validation(format!(
            "unknown command: {}\n\n{}",
            other, USAGE
        ))),
    }
}
