pub mod family_list;
pub mod login;
pub mod payment_form;
pub mod record_payment;
