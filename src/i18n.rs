//! Language selection and user-facing strings
//!
//! Pure lookup tables, no logic. The session stores which language a chat
//! uses; everything user-visible goes through [`Lang::text`].

use serde::{Deserialize, Serialize};

/// Language of a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    /// Russian (default, matching the backend's audience)
    #[default]
    Ru,
    /// English
    En,
}

/// Keys for every user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    /// Greeting sent on the very first message of a chat
    Welcome,
    /// Gate reply for unauthenticated traffic
    NotAuthenticated,
    /// Prompt for the email step
    EnterLogin,
    /// Prompt for the password step
    EnterPassword,
    /// Login rejected (or failed)
    InvalidCredentials,
    /// Login succeeded
    LoginOk,
    /// Header of the actions menu
    AvailableActions,
    /// Header of the completed-tickets view
    CompletedTickets,
    /// Header of the uncompleted-tickets view
    UncompletedTickets,
    /// Empty completed-tickets view
    NoCompletedTickets,
    /// Empty uncompleted-tickets view
    NoUncompletedTickets,
    /// Header of a ticket-created notification
    TicketCreated,
    /// Header of a ticket-updated notification
    TicketUpdated,
    /// Ticket field label
    TicketTitle,
    /// Ticket field label
    TicketDescription,
    /// Ticket field label
    TicketCreatedAt,
    /// Ticket field label
    TicketUpdatedAt,
    /// Ticket field label
    TicketStatus,
    /// Status value for a done ticket
    Completed,
    /// Status value for an open ticket
    InProgress,
    /// Device field label
    DeviceTitle,
    /// Device field label
    DeviceInventoryNumber,
    /// Subscription started
    SubscriptionOk,
    /// Subscription stopped
    UnsubscriptionOk,
    /// Unsubscribe requested with no active subscription
    NotSubscribed,
    /// The push channel died; the user has to re-subscribe
    SubscriptionLost,
    /// Language selection prompt
    LanguagePrompt,
    /// Confirmation after switching to Russian
    LanguageSetRu,
    /// Confirmation after switching to English
    LanguageSetEn,
    /// Generic failure message
    GenericError,
    /// Menu button: completed tickets
    BtnCompleted,
    /// Menu button: uncompleted tickets
    BtnUncompleted,
    /// Menu button: subscribe
    BtnSubscribe,
    /// Menu button: unsubscribe
    BtnUnsubscribe,
    /// Menu button: change language
    BtnLanguage,
}

impl Lang {
    /// Returns the localized string for `key`
    #[must_use]
    pub const fn text(self, key: Text) -> &'static str {
        match self {
            Self::Ru => ru_text(key),
            Self::En => en_text(key),
        }
    }
}

const fn en_text(key: Text) -> &'static str {
    match key {
        Text::Welcome => {
            "Welcome! Thank you for using our bot.\n\nTo get started, enter the command /login to begin the authentication process."
        }
        Text::NotAuthenticated => {
            "You need to be authenticated to perform this operation. Please enter the command /login to start the authentication process."
        }
        Text::EnterLogin => "Please enter your login:",
        Text::EnterPassword => "Now enter your password:",
        Text::InvalidCredentials => "Invalid login or password. Please try again.",
        Text::LoginOk => "To view the list of available actions, use the command /actions.",
        Text::AvailableActions => "Available actions:",
        Text::CompletedTickets => "Completed tickets:",
        Text::UncompletedTickets => "Uncompleted tickets:",
        Text::NoCompletedTickets => "You have no completed tickets.",
        Text::NoUncompletedTickets => "You have no uncompleted tickets.",
        Text::TicketCreated => "New ticket",
        Text::TicketUpdated => "Ticket updated",
        Text::TicketTitle => "Title",
        Text::TicketDescription => "Description",
        Text::TicketCreatedAt => "Created at",
        Text::TicketUpdatedAt => "Updated at",
        Text::TicketStatus => "Status",
        Text::Completed => "Done",
        Text::InProgress => "In progress",
        Text::DeviceTitle => "Device",
        Text::DeviceInventoryNumber => "Inventory number",
        Text::SubscriptionOk => "You are subscribed to ticket notifications.",
        Text::UnsubscriptionOk => "You are unsubscribed from ticket notifications.",
        Text::NotSubscribed => "You have no active subscription.",
        Text::SubscriptionLost => {
            "Ticket notifications were interrupted. Use /actions to subscribe again."
        }
        Text::LanguagePrompt => "Please select your language:",
        Text::LanguageSetRu => "Language set to Russian.",
        Text::LanguageSetEn => "Language set to English.",
        Text::GenericError => "An error occurred. Please try again later.",
        Text::BtnCompleted => "✅ Completed tickets",
        Text::BtnUncompleted => "🕐 Uncompleted tickets",
        Text::BtnSubscribe => "🔔 Subscribe to notifications",
        Text::BtnUnsubscribe => "🔕 Unsubscribe from notifications",
        Text::BtnLanguage => "🌐 Change language",
    }
}

const fn ru_text(key: Text) -> &'static str {
    match key {
        Text::Welcome => {
            "Добро пожаловать! Спасибо, что используете нашего бота.\n\nЧтобы начать, введите команду /login для прохождения аутентификации."
        }
        Text::NotAuthenticated => {
            "Для выполнения этой операции необходимо войти в систему. Введите команду /login, чтобы начать аутентификацию."
        }
        Text::EnterLogin => "Введите ваш логин:",
        Text::EnterPassword => "Теперь введите пароль:",
        Text::InvalidCredentials => "Неверный логин или пароль. Попробуйте ещё раз.",
        Text::LoginOk => "Чтобы посмотреть список доступных действий, используйте команду /actions.",
        Text::AvailableActions => "Доступные действия:",
        Text::CompletedTickets => "Завершённые заявки:",
        Text::UncompletedTickets => "Незавершённые заявки:",
        Text::NoCompletedTickets => "У вас нет завершённых заявок.",
        Text::NoUncompletedTickets => "У вас нет незавершённых заявок.",
        Text::TicketCreated => "Новая заявка",
        Text::TicketUpdated => "Заявка обновлена",
        Text::TicketTitle => "Название",
        Text::TicketDescription => "Описание",
        Text::TicketCreatedAt => "Создана",
        Text::TicketUpdatedAt => "Обновлена",
        Text::TicketStatus => "Статус",
        Text::Completed => "Выполнена",
        Text::InProgress => "В работе",
        Text::DeviceTitle => "Устройство",
        Text::DeviceInventoryNumber => "Инвентарный номер",
        Text::SubscriptionOk => "Вы подписаны на уведомления о заявках.",
        Text::UnsubscriptionOk => "Вы отписаны от уведомлений о заявках.",
        Text::NotSubscribed => "У вас нет активной подписки.",
        Text::SubscriptionLost => {
            "Уведомления о заявках прервались. Подпишитесь снова через /actions."
        }
        Text::LanguagePrompt => "Выберите язык:",
        Text::LanguageSetRu => "Установлен русский язык.",
        Text::LanguageSetEn => "Установлен английский язык.",
        Text::GenericError => "Произошла ошибка. Попробуйте позже.",
        Text::BtnCompleted => "✅ Завершённые заявки",
        Text::BtnUncompleted => "🕐 Незавершённые заявки",
        Text::BtnSubscribe => "🔔 Подписаться на уведомления",
        Text::BtnUnsubscribe => "🔕 Отписаться от уведомлений",
        Text::BtnLanguage => "🌐 Сменить язык",
    }
}
