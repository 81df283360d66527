// Registration, login, vehicles and chat through the services

mod common;

use common::fixtures::*;
use serde_json::json;
use server::database::{AccountType, MatchType, Sender};
use server::errors::{AccountError, LuberError};
use server::services::account_service::{NewVehicle, RegisterRequest};
use server::services::chat_service::BotReplyRequest;
use server::services::{AccountService, ChatNotifier, ChatService};
use std::sync::Arc;

const FIRST_REPLY: &str = "🤖 Thanks for your message. An advisor will be with you shortly.";

struct Harness {
    test_db: TestDatabase,
    accounts: AccountService,
    chat: ChatService,
    publisher: Arc<RecordingPublisher>,
}

async fn harness() -> Harness {
    let test_db = TestDatabase::new().await.unwrap();
    let publisher = Arc::new(RecordingPublisher::new());
    let notifier = ChatNotifier::new(test_db.database(), publisher.clone());
    Harness {
        accounts: AccountService::new(test_db.database(), notifier.clone(), 4),
        chat: ChatService::new(test_db.database(), notifier),
        test_db,
        publisher,
    }
}

fn register_request(email: &str) -> RegisterRequest {
    serde_json::from_value(json!({
        "accountType": "Fleet",
        "fullName": "  Acme Trucks ",
        "address": "1 Depot Way",
        "phone": "555-0199",
        "email": email,
        "password": PASSWORD,
        "vehicles": [
            { "brand": "Ford", "model": "Transit", "year": 2021, "plateLast3": "TR1",
              "serviceIntervals": "7500" },
            { "brand": "Ram", "model": "ProMaster", "year": 2020, "plateLast3": "PM2",
              "serviceIntervals": [5000, 10000] }
        ]
    }))
    .unwrap()
}

async fn bot_reply(h: &Harness, question: &str, answer: &str, match_type: MatchType) {
    h.chat
        .save_bot_reply(BotReplyRequest {
            question: Some(question.into()),
            answer: Some(answer.into()),
            match_type: Some(match_type),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn register_creates_customer_vehicles_and_conversation() {
    let h = harness().await;
    let email = random_email();

    let customer = h.accounts.register(register_request(&email)).await.unwrap();
    assert_eq!(customer.account_type, AccountType::Fleet);
    assert_eq!(customer.full_name, "Acme Trucks");
    assert_ne!(customer.password_hash, PASSWORD);

    let profile = h.accounts.profile(&customer.id).await.unwrap();
    assert_eq!(profile.vehicles.len(), 2);
    assert_eq!(profile.vehicles[0].service_intervals, vec![7500]);
    assert_eq!(profile.vehicles[1].base_interval, 5000);
    assert!(profile.cancellations.is_empty());

    let serialized = serde_json::to_value(&profile).unwrap();
    assert!(serialized.get("passwordHash").is_none());
    assert_eq!(serialized["email"], email);

    let conversation = h
        .test_db
        .database()
        .get_conversation_by_customer(&customer.id)
        .await
        .unwrap()
        .unwrap();
    assert!(conversation.messages.is_empty());
}

#[tokio::test]
async fn duplicate_email_is_refused() {
    let h = harness().await;
    let email = random_email();
    h.accounts.register(register_request(&email)).await.unwrap();

    let err = h.accounts.register(register_request(&email)).await.unwrap_err();
    assert!(matches!(
        err,
        LuberError::Account(AccountError::EmailTaken { .. })
    ));
    assert_eq!(err.status_code().as_u16(), 400);
    assert_eq!(err.to_string(), "This email is already registered.");
}

#[tokio::test]
async fn login_checks_password_and_logs_ip() {
    let h = harness().await;
    let email = random_email();
    let customer = h.accounts.register(register_request(&email)).await.unwrap();

    let err = h
        .accounts
        .login(&email, "wrong", "198.51.100.4")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid credentials");
    assert_eq!(err.status_code().as_u16(), 401);

    let err = h
        .accounts
        .login("nobody@luber.test", PASSWORD, "198.51.100.4")
        .await
        .unwrap_err();
    assert_eq!(err.status_code().as_u16(), 401);

    let logged_in = h
        .accounts
        .login(&email, PASSWORD, "198.51.100.4")
        .await
        .unwrap();
    assert_eq!(logged_in.id, customer.id);

    let log = h
        .test_db
        .database()
        .list_login_log(&customer.id)
        .await
        .unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].ip, "198.51.100.4");
    assert_eq!(log[0].account_type, AccountType::Fleet);
}

#[tokio::test]
async fn adding_a_vehicle_posts_a_chat_notice() {
    let h = harness().await;
    let customer = h.test_db.seed_customer(AccountType::Customer).await.unwrap();

    let vehicle = h
        .accounts
        .add_vehicle(
            &customer.id,
            NewVehicle {
                brand: "Honda".into(),
                model: "Civic".into(),
                plate_last3: "ABC".into(),
                ..NewVehicle::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(vehicle.customer_id, customer.id);

    let published = h.publisher.published().await;
    assert_eq!(published.len(), 1);
    let message = &published[0].messages[0];
    assert_eq!(message.sender, Sender::Office);
    assert_eq!(message.text, "🚗 New vehicle added: Honda Civic (Plate *ABC*)");
}

#[tokio::test]
async fn milage_must_be_non_negative_and_owned() {
    let h = harness().await;
    let customer = h.test_db.seed_customer(AccountType::Customer).await.unwrap();
    let vehicle = h.test_db.seed_vehicle(&customer.id).await.unwrap();
    let stranger = h.test_db.seed_customer(AccountType::Customer).await.unwrap();

    assert_eq!(
        h.accounts
            .update_milage(&customer.id, &vehicle.id, Some(12_345.9))
            .await
            .unwrap(),
        12_345
    );

    for bad in [None, Some(-1.0), Some(f64::NAN)] {
        let err = h
            .accounts
            .update_milage(&customer.id, &vehicle.id, bad)
            .await
            .unwrap_err();
        assert_eq!(err.status_code().as_u16(), 400);
    }

    let err = h
        .accounts
        .update_milage(&stranger.id, &vehicle.id, Some(10.0))
        .await
        .unwrap_err();
    assert_eq!(err.status_code().as_u16(), 404);
}

#[tokio::test]
async fn cancellation_toggle_validates_timestamp() {
    let h = harness().await;
    let customer = h.test_db.seed_customer(AccountType::Customer).await.unwrap();

    let err = h
        .accounts
        .toggle_cancellation_archive(&customer.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.status_code().as_u16(), 400);

    let err = h
        .accounts
        .toggle_cancellation_archive(&customer.id, Some("yesterday"))
        .await
        .unwrap_err();
    assert_eq!(err.status_code().as_u16(), 400);

    let err = h
        .accounts
        .toggle_cancellation_archive(&customer.id, Some("2030-01-01T10:00:00Z"))
        .await
        .unwrap_err();
    assert_eq!(err.status_code().as_u16(), 404);
}

#[tokio::test]
async fn first_message_gets_the_welcome_bot_reply_once() {
    let h = harness().await;
    let customer = h.test_db.seed_customer(AccountType::Customer).await.unwrap();

    let messages = h
        .chat
        .send_customer_message(&customer.id, "Hello there", "")
        .await
        .unwrap();
    // Response reflects the conversation right after the customer message
    assert_eq!(messages.len(), 1);
    assert_eq!(h.publisher.count().await, 2);

    let history = h.chat.history(&customer.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].sender, Sender::Office);
    assert_eq!(history[1].text, FIRST_REPLY);

    h.chat
        .send_customer_message(&customer.id, "Anyone?", "")
        .await
        .unwrap();
    assert_eq!(h.chat.history(&customer.id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn keyword_replies_use_alternatives_and_match_type() {
    let h = harness().await;
    let customer = h.test_db.seed_customer(AccountType::Customer).await.unwrap();
    bot_reply(
        &h,
        "  What are your {{hours|opening times}}  ",
        "9 AM to 9 PM daily",
        MatchType::Partial,
    )
    .await;
    bot_reply(&h, "price", "Oil changes start at $49", MatchType::Exact).await;

    // Consume the first-message reply
    h.chat
        .send_customer_message(&customer.id, "hi", "")
        .await
        .unwrap();

    h.chat
        .send_customer_message(&customer.id, "Hey, WHAT ARE YOUR OPENING TIMES?", "")
        .await
        .unwrap();
    let history = h.chat.history(&customer.id).await.unwrap();
    assert_eq!(history.last().unwrap().text, "🤖 9 AM to 9 PM daily");

    h.chat
        .send_customer_message(&customer.id, "what is the price", "")
        .await
        .unwrap();
    let history = h.chat.history(&customer.id).await.unwrap();
    assert_eq!(history.last().unwrap().sender, Sender::Customer);

    h.chat
        .send_customer_message(&customer.id, "  Price ", "")
        .await
        .unwrap();
    let history = h.chat.history(&customer.id).await.unwrap();
    assert_eq!(history.last().unwrap().text, "🤖 Oil changes start at $49");
}

#[tokio::test]
async fn bot_reply_admin_normalizes_and_validates() {
    let h = harness().await;

    let saved = h
        .chat
        .save_bot_reply(BotReplyRequest {
            question: Some("  Where Are You? ".into()),
            answer: Some("Mobile service, we come to you".into()),
            match_type: None,
        })
        .await
        .unwrap();
    assert_eq!(saved.question, "where are you?");
    assert_eq!(saved.match_type, MatchType::Partial);

    let err = h
        .chat
        .save_bot_reply(BotReplyRequest {
            question: Some("hours".into()),
            answer: Some("   ".into()),
            match_type: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.status_code().as_u16(), 400);

    assert_eq!(h.chat.bot_replies().await.unwrap().len(), 1);
}

#[tokio::test]
async fn office_reply_and_archive_follow_the_conversation() {
    let h = harness().await;
    let customer = h.test_db.seed_customer(AccountType::Customer).await.unwrap();
    h.chat
        .send_customer_message(&customer.id, "Can I move my appointment?", "")
        .await
        .unwrap();

    let conversation_id = h.chat.active_conversations().await.unwrap()[0].id.clone();

    let messages = h
        .chat
        .office_reply(Some(&conversation_id), "Sure, which day?", "https://cdn.luber.test/map.png")
        .await
        .unwrap();
    assert_eq!(messages.last().unwrap().image_url, "https://cdn.luber.test/map.png");

    h.chat.archive(Some(&conversation_id)).await.unwrap();
    assert!(h.chat.active_conversations().await.unwrap().is_empty());

    // The customer writing again brings it back
    h.chat
        .send_customer_message(&customer.id, "Thursday", "")
        .await
        .unwrap();
    assert_eq!(h.chat.active_conversations().await.unwrap().len(), 1);

    let err = h.chat.office_reply(Some("missing"), "hi", "").await.unwrap_err();
    assert_eq!(err.status_code().as_u16(), 404);
    let err = h.chat.archive(None).await.unwrap_err();
    assert_eq!(err.status_code().as_u16(), 400);
}

#[tokio::test]
async fn unreachable_hub_does_not_fail_chat() {
    let test_db = TestDatabase::new().await.unwrap();
    let notifier = ChatNotifier::new(test_db.database(), Arc::new(FailingPublisher));
    let chat = ChatService::new(test_db.database(), notifier);
    let customer = test_db.seed_customer(AccountType::Customer).await.unwrap();

    let messages = chat
        .send_customer_message(&customer.id, "Hello", "")
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(chat.history(&customer.id).await.unwrap().len(), 2);
}
