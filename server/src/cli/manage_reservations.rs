use crate::cli::CliAuthTokenKey;
use crate::cli_error::CliError;
use crate::data_store::auth_token::AuthToken;
use crate::data_store::models::ReservationStatus;
use crate::data_store::{
    get_store_from_env, ReservationFilterBuilder, ReservationOrder, RoomBookStore,
};

/// Print the review queue, i.e. all pending reservations, soonest first.
pub fn print_pending_reservations() -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let auth_key = CliAuthTokenKey::new();
    let auth_token = AuthToken::create_for_cli(&auth_key);
    let mut filter = ReservationFilterBuilder::new();
    filter.status_is_one_of(vec![ReservationStatus::Pending]);
    let reservations = data_store.get_reservations_filtered(
        &auth_token,
        filter.build(),
        ReservationOrder::StartTimeAscending,
        None,
    )?;

    let mut table = comfy_table::Table::new();
    table
        .load_preset(comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED)
        .set_header(vec![
            "id",
            "room",
            "event",
            "participants",
            "start",
            "end",
            "requested by",
            "requested at",
        ])
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic)
        .add_rows(reservations.items.into_iter().map(|reservation| {
            [
                reservation.id.to_string(),
                reservation.room_id.to_string(),
                reservation.event_name,
                reservation.participants.to_string(),
                reservation.start_time.to_string(),
                reservation.end_time.to_string(),
                reservation.user_id.to_string(),
                reservation.created_at.to_string(),
            ]
        }));

    println!("{} pending reservation(s):", reservations.total_count);
    println!("{table}");
    Ok(())
}
