fn main() {
    use code_store::{CodeRange, CodeStore};

    let mut store = CodeStore::new();

    let start = store.used();
    for line in ["echo one", "echo two", "echo three"] {
        store.load_line(line);
    }
    let program = CodeRange::new(start, 3);

    for idx in program.start()..program.limit() {
        if let Some(line) = store.get_line(idx) {
            println!("{idx:>4}  {line}");
        }
    }

    println!("used={} remaining={}", store.used(), store.remaining());
    store.release(program);
    println!("after release: used={} remaining={}", store.used(), store.remaining());
}
