use competition::Competition;

pub struct AppState {
    pub competition: Competition,
}
