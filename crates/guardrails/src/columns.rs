//! Column allowlists for the tables the gateway knows about.
//!
//! Names are stored lowercase; dialects apply their own identifier case.

/// Columns of `lvousr.contact`.
pub const CONTACT_COLUMNS: &[&str] = &[
    "lvaccount_id", "client_id", "account", "b_active", "account_to_speak",
    "first_name", "last_name", "dob", "email_address", "ssn", "phone1", "phone2",
    "phone3", "phone4", "phone5", "phone6", "phone7", "phone8", "phone9", "phone10",
    "address1", "address2", "city", "state", "postalcode", "country_id",
    "guarantor_firstname", "guarantor_lastname", "paymentbalance", "amount_to_speak",
    "account_due_date", "callattemptstoday", "callattemptslifetime", "createdate",
    "createuser", "modifydate", "modifyuser", "initial_load_date",
    "initial_load_campaignid", "last_load_date", "last_load_campaignid", "do_not_dial",
    "do_not_dial_daily", "group_id", "original_account_number", "phone1_attempts_today",
    "phone1_attempts_lifetime", "phone1_dnd", "phone1_dnd_daily",
    "phone2_attempts_today", "phone2_attempts_lifetime", "phone2_dnd",
    "phone2_dnd_daily", "phone3_attempts_today", "phone3_attempts_lifetime",
    "phone3_dnd", "phone3_dnd_daily", "phone4_attempts_today",
    "phone4_attempts_lifetime", "phone4_dnd", "phone4_dnd_daily",
    "phone5_attempts_today", "phone5_attempts_lifetime", "phone5_dnd",
    "phone5_dnd_daily", "phone6_attempts_today", "phone6_attempts_lifetime",
    "phone6_dnd", "phone6_dnd_daily", "phone7_attempts_today",
    "phone7_attempts_lifetime", "phone7_dnd", "phone7_dnd_daily",
    "phone8_attempts_today", "phone8_attempts_lifetime", "phone8_dnd",
    "phone8_dnd_daily", "phone9_attempts_today", "phone9_attempts_lifetime",
    "phone9_dnd", "phone9_dnd_daily", "phone10_attempts_today",
    "phone10_attempts_lifetime", "phone10_dnd", "phone10_dnd_daily", "sms", "email",
    "phone1_sms_consent", "phone1_cell_consent", "phone2_sms_consent",
    "phone2_cell_consent", "phone3_sms_consent", "phone3_cell_consent",
    "phone4_sms_consent", "phone4_cell_consent", "phone5_sms_consent",
    "phone5_cell_consent", "phone6_sms_consent", "phone6_cell_consent",
    "phone7_sms_consent", "phone7_cell_consent", "phone8_sms_consent",
    "phone8_cell_consent", "phone9_sms_consent", "phone9_cell_consent",
    "phone10_sms_consent", "phone10_cell_consent", "primary_email_consent", "agent_id",
    "agent_team_id", "description", "department", "salutation", "title",
    "happiness_index", "happiness_trend", "happiness_ndx_updated",
];

/// Key columns of `lvousr.contact_details`; `col1`..`col100` follow them.
pub const CONTACT_DETAILS_BASE_COLUMNS: &[&str] = &[
    "lvaccount_id", "client_id", "account",
];

/// Number of generic `colN` columns on `lvousr.contact_details`.
pub const CONTACT_DETAILS_GENERIC_COLUMNS: usize = 100;

/// Columns of `lvousr.transaction` and its monthly archives.
///
/// `client_id` on this table holds a skill id, not a customer id.
pub const TRANSACTION_COLUMNS: &[&str] = &[
    "acct_transaction_id", "account", "patient_firstname", "patient_lastname",
    "guarantor_firstname", "guarantor_lastname", "patient_phone1", "patient_phone2",
    "patient_dob", "patient_email", "patient_ssn", "patient_first_id",
    "patient_second_id", "practice_id", "client_id", "client_practice_id",
    "practice_phone", "practice_phone_alternate", "operator_phone",
    "place_of_service_id", "alt_language_1", "alt_language_2", "alt_language_3",
    "language_callback_1", "language_callback_2", "language_callback_3", "practice_fax",
    "insurance_type", "insurance_company", "template_id", "requeue_id",
    "last_payment_date", "total_amount", "minimum_payment_amount", "account_to_speak",
    "amount_to_speak", "discount_amount_to_speak", "discount_percentage_to_speak",
    "days_to_speak", "amount_1", "days_due_1", "amount_2", "days_due_2", "amount_3",
    "days_due_3", "amount_4", "days_due_4", "amount_5", "days_due_5", "amount_6",
    "days_due_6", "input_id_menu", "input_dynamic_menu_1", "input_dynamic_menu_2",
    "input_credit_card_number", "input_credit_card_exp_date", "input_approval_code",
    "input_payment_amount", "input_other_phone_number", "input_fax_phone_number",
    "input_ssn", "input_dob", "input_first_id", "input_second_id",
    "confirm_credit_card_number", "confirm_credit_card_exp_date",
    "confirm_approval_code", "confirm_payment_amount", "confirm_other_phone_number",
    "confirm_fax_phone_number", "confirm_first_id", "confirm_second_id", "language",
    "extra_1", "extra_2", "extra_3", "extra_4", "extra_5", "extra_6", "extra_7",
    "extra_8", "extra_9", "extra_10", "extra_11", "extra_12", "extra_13", "extra_14",
    "extra_15", "extra_16", "extra_17", "extra_18", "extra_19", "extra_20",
    "live_person", "machine", "not_available", "lead_1", "lead_2", "lead_3", "lead_4",
    "lead_5", "lead_6", "lead_credit_card_number", "lead_other_phone_number",
    "lead_other_fax_number", "no_input", "queued", "b_active", "transaction_update",
    "attempt", "call_start_time", "call_connect_time", "call_finish_time",
    "call_duration", "outcome", "result1", "result2", "tfh_result", "phone_dialed",
    "phone_update", "transfer_connect_time", "transfer_duration", "date_modified",
    "billing", "session_id", "campaign_id", "lvtransaction_type",
    "original_account_number", "chat_rating", "lvtransaction_subtype",
    "assigned_thread_owner_agent_id", "active_thread",
];

/// Columns of `lvousr.campaign` exposed for reads.
pub const CAMPAIGN_COLUMNS: &[&str] = &[
    "campaign_id", "client_id", "filename", "start_time", "end_time", "leave_messages",
    "operator_phone", "callback_phone", "caller_id", "voice_id", "b_active", "skill_id",
    "dialing_strategy_id", "am_option", "campaign_type_id", "contact_source",
    "email_from", "campaign_subtype", "create_date",
];

/// Columns of the client routing table.
pub const CLIENT_COLUMNS: &[&str] = &[
    "client_id", "client_name", "dialing_db", "reporting_db", "b_active",
];

/// Builds the full `lvousr.contact_details` column list in table order.
pub fn contact_details_columns() -> Vec<String> {
    CONTACT_DETAILS_BASE_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain((1..=CONTACT_DETAILS_GENERIC_COLUMNS).map(|i| format!("col{i}")))
        .collect()
}
