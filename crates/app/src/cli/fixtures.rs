use std::path::PathBuf;

use clap::{Args, Subcommand};
use trolley::{fixtures::Fixture, money::format_minor};
use trolley_app::{
    database::{self, Db},
    domain::{coupons::PgCouponsRepository, offers::PgOffersRepository},
};

#[derive(Debug, Args)]
pub(crate) struct FixturesCommand {
    #[command(subcommand)]
    command: FixturesSubcommand,
}

#[derive(Debug, Subcommand)]
enum FixturesSubcommand {
    /// Load a fixture set and report what it contains
    Check(SetArgs),

    /// Write a fixture set's coupons and offers to the database
    Seed(SeedArgs),
}

#[derive(Debug, Args)]
pub(crate) struct SetArgs {
    /// Directory holding products/, coupons/ and offers/
    #[arg(long, env = "FIXTURES_PATH", default_value = "./fixtures")]
    path: PathBuf,

    /// Fixture set name
    #[arg(long, env = "FIXTURE_SET", default_value = "default")]
    set: String,
}

#[derive(Debug, Args)]
pub(crate) struct SeedArgs {
    #[command(flatten)]
    fixture: SetArgs,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

pub(crate) async fn run(command: FixturesCommand) -> Result<(), String> {
    match command.command {
        FixturesSubcommand::Check(args) => check(&args),
        FixturesSubcommand::Seed(args) => seed(args).await,
    }
}

fn load(args: &SetArgs) -> Result<Fixture, String> {
    Fixture::from_set_in(args.path.clone(), &args.set)
        .map_err(|error| format!("failed to load fixture set {}: {error}", args.set))
}

fn check(args: &SetArgs) -> Result<(), String> {
    let fixture = load(args)?;
    let currency = fixture
        .currency()
        .map_err(|error| format!("fixture set {} is incomplete: {error}", args.set))?;

    let catalog = fixture.catalog();

    let mut products: Vec<_> = catalog.iter().collect();
    products.sort_by(|a, b| a.name.cmp(&b.name));

    println!("currency: {}", currency.iso_alpha_code);

    for product in products {
        let state = if product.active { "" } else { " (inactive)" };

        println!(
            "product: {} {}{state}",
            product.name,
            format_minor(product.unit_price, currency)
        );
    }

    println!("coupons: {}", fixture.coupons().count());
    println!("offers: {}", fixture.offers().count());

    Ok(())
}

async fn seed(args: SeedArgs) -> Result<(), String> {
    let fixture = load(&args.fixture)?;

    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let db = Db::new(pool);
    let coupons = PgCouponsRepository::new(db.clone());
    let offers = PgOffersRepository::new(db);

    for coupon in fixture.coupons() {
        coupons
            .upsert_coupon(coupon)
            .await
            .map_err(|error| format!("failed to store coupon {}: {error}", coupon.code))?;
    }

    for offer in fixture.offers() {
        offers
            .upsert_offer(offer)
            .await
            .map_err(|error| format!("failed to store offer {}: {error}", offer.name))?;
    }

    println!(
        "seeded {} coupons and {} offers",
        fixture.coupons().count(),
        fixture.offers().count()
    );

    Ok(())
}
